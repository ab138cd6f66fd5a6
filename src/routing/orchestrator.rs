//! Per-request routing state machine.
//!
//! # States
//! ```text
//! Selecting ──no peer──────────────────────────────▶ Rejected
//!     │
//!     ▼
//! Forwarding ──ok──────────────────────────────────▶ Succeeded
//!     │ failure
//!     ├─ retry budget left ─▶ Retrying (backoff) ─▶ Forwarding (same peer)
//!     ├─ attempts left ─────▶ FailingOver (mark dead) ─▶ Selecting
//!     └─ otherwise ─────────────────────────────────▶ Rejected
//!
//! Cancellation at any suspension point ──────────────▶ Cancelled
//! Deadline at any suspension point ─────────────────▶ DeadlineExceeded
//! ```

use std::future::pending;
use std::sync::Arc;
use axum::body::Body;
use axum::http::Response;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use crate::load_balancer::BackendRegistry;
use crate::observability::metrics;
use crate::resilience::{AttemptState, RetryPolicy};
use crate::routing::forwarder::{ForwardError, Forwarder, ReplayableRequest};

/// Why a request was turned away with 503.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Every backend is marked dead.
    NoPeerAvailable,
    /// The attempt budget ran out.
    AttemptsExhausted,
}

/// Terminal result of routing one request.
#[derive(Debug)]
pub enum RouteOutcome {
    Succeeded(Response<Body>),
    Rejected(RejectReason),
    /// The caller cancelled.
    Cancelled,
    /// The per-request deadline passed.
    DeadlineExceeded,
}

impl RouteOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RouteOutcome::Succeeded(_) => "succeeded",
            RouteOutcome::Rejected(RejectReason::NoPeerAvailable) => "no_peer",
            RouteOutcome::Rejected(RejectReason::AttemptsExhausted) => "attempts_exhausted",
            RouteOutcome::Cancelled => "cancelled",
            RouteOutcome::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

/// The outcome together with the escalation state it ended in.
#[derive(Debug)]
pub struct Routed {
    pub outcome: RouteOutcome,
    pub state: AttemptState,
}

/// Ties the registry, the retry policy and a forwarder together.
#[derive(Debug)]
pub struct Orchestrator<F> {
    registry: Arc<BackendRegistry>,
    forwarder: F,
    policy: RetryPolicy,
}

impl<F: Forwarder> Orchestrator<F> {
    pub fn new(registry: Arc<BackendRegistry>, forwarder: F, policy: RetryPolicy) -> Self {
        Self {
            registry,
            forwarder,
            policy,
        }
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Route one request until it succeeds, is rejected, or is cancelled.
    ///
    /// `cancel` is watched at every suspension point, as is `deadline` when
    /// given. Either one stops routing at once and cancels the in-flight
    /// forward.
    pub async fn route(
        &self,
        request: ReplayableRequest,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Routed {
        let deadline = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut state = AttemptState::new();

        loop {
            // Selecting
            let Some(peer) = self.registry.next_peer() else {
                tracing::warn!(attempt = state.attempt_count, "No backend available, rejecting");
                return Routed {
                    outcome: RouteOutcome::Rejected(RejectReason::NoPeerAvailable),
                    state,
                };
            };
            let endpoint = peer.endpoint();

            loop {
                // Forwarding
                let attempt = cancel.child_token();
                let forwarded = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(backend = %endpoint, "Request cancelled while forwarding");
                        return Routed { outcome: RouteOutcome::Cancelled, state };
                    }
                    _ = &mut deadline => {
                        attempt.cancel();
                        tracing::warn!(backend = %endpoint, "Request deadline passed while forwarding");
                        return Routed { outcome: RouteOutcome::DeadlineExceeded, state };
                    }
                    result = self.forwarder.forward(endpoint, request.clone(), attempt.clone()) => result,
                };

                let error = match forwarded {
                    Ok(response) => {
                        tracing::debug!(
                            backend = %endpoint,
                            status = %response.status(),
                            retry = state.retry_count,
                            attempt = state.attempt_count,
                            "Forwarded request"
                        );
                        return Routed {
                            outcome: RouteOutcome::Succeeded(response),
                            state,
                        };
                    }
                    Err(ForwardError::Cancelled) => {
                        tracing::debug!(backend = %endpoint, "Forwarder reported cancellation");
                        return Routed { outcome: RouteOutcome::Cancelled, state };
                    }
                    Err(e) => e,
                };

                tracing::warn!(
                    backend = %endpoint,
                    retry = state.retry_count,
                    attempt = state.attempt_count,
                    error = %error,
                    "Forwarding failed"
                );

                if !self.policy.should_retry_same_backend(&state) {
                    break;
                }

                // Retrying
                state = state.retried();
                metrics::record_retry(endpoint.as_str());
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(backend = %endpoint, "Request cancelled during backoff");
                        return Routed { outcome: RouteOutcome::Cancelled, state };
                    }
                    _ = &mut deadline => {
                        tracing::warn!(backend = %endpoint, "Request deadline passed during backoff");
                        return Routed { outcome: RouteOutcome::DeadlineExceeded, state };
                    }
                    _ = sleep(self.policy.backoff) => {}
                }
            }

            // FailingOver
            tracing::warn!(backend = %endpoint, retries = state.retry_count, "Retry budget spent, marking backend dead");
            self.registry.mark(endpoint, false);
            metrics::record_failover(endpoint.as_str());

            state = state.failed_over();
            if !self.policy.should_failover(&state) {
                tracing::warn!(attempt = state.attempt_count, "Attempt budget spent, rejecting");
                return Routed {
                    outcome: RouteOutcome::Rejected(RejectReason::AttemptsExhausted),
                    state,
                };
            }
        }
    }
}
