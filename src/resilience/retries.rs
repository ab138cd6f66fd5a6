//! Retry and failover decisions.
//!
//! # Responsibilities
//! - Carry the per-request retry/attempt counters
//! - Decide between same-backend retry, failover, and giving up
//!
//! # Design Decisions
//! - Backoff between retries is fixed; it throttles tight failure loops
//! - Attempts are counted after the increment on failover, and never reset
//!   within a request

use std::time::Duration;
use crate::config::RetryConfig;

/// Escalation state for one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptState {
    /// Consecutive retries against the current backend.
    pub retry_count: u32,
    /// Distinct backends tried so far, including the current one.
    pub attempt_count: u32,
}

impl AttemptState {
    pub fn new() -> Self {
        Self {
            retry_count: 0,
            attempt_count: 1,
        }
    }

    /// State for resubmitting to the same backend.
    #[must_use]
    pub fn retried(self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self
        }
    }

    /// State after giving up on the current backend.
    #[must_use]
    pub fn failed_over(self) -> Self {
        Self {
            retry_count: 0,
            attempt_count: self.attempt_count + 1,
        }
    }
}

impl Default for AttemptState {
    fn default() -> Self {
        Self::new()
    }
}

/// Limits and backoff governing escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_limit: u32,
    pub attempt_limit: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_RETRY_LIMIT: u32 = 3;
    pub const DEFAULT_ATTEMPT_LIMIT: u32 = 3;
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(10);

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            retry_limit: config.retry_limit,
            attempt_limit: config.attempt_limit,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    /// True while the current backend still has retry budget.
    pub fn should_retry_same_backend(&self, state: &AttemptState) -> bool {
        state.retry_count < self.retry_limit
    }

    /// Called with the state already advanced by [`AttemptState::failed_over`].
    pub fn should_failover(&self, state: &AttemptState) -> bool {
        state.attempt_count <= self.attempt_limit
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_limit: Self::DEFAULT_RETRY_LIMIT,
            attempt_limit: Self::DEFAULT_ATTEMPT_LIMIT,
            backoff: Self::DEFAULT_BACKOFF,
        }
    }
}
