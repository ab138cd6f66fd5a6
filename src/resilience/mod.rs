//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding failure on backend B:
//!     → retries.rs: retry budget left for B?
//!         yes → fixed backoff, resubmit to B
//!         no  → B marked dead, attempt budget left?
//!                 yes → select another backend
//!                 no  → reject (503)
//! ```
//!
//! # Design Decisions
//! - Decisions are pure functions of an explicit per-request state value
//! - Cancellation is never retried and never spends budget

pub mod retries;

pub use retries::{AttemptState, RetryPolicy};
