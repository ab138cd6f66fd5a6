//! Routing decision engine.
//!
//! # Data Flow
//! ```text
//! Inbound request (body buffered → ReplayableRequest)
//!     → orchestrator.rs
//!         → registry: next live peer
//!         → forwarder.rs: Forwarder::forward(peer, request)
//!         → on failure: resilience::retries decides retry / failover / reject
//!     → RouteOutcome (response, 503, or cancelled)
//! ```
//!
//! # Design Decisions
//! - The registry is injected, never global
//! - Retry/attempt counters are an explicit value threaded through the loop
//! - The forwarder is a trait so the engine runs without a network in tests

pub mod forwarder;
pub mod orchestrator;

pub use forwarder::{BufferError, ForwardError, Forwarder, ReplayableRequest};
pub use orchestrator::{Orchestrator, RejectReason, RouteOutcome, Routed};
