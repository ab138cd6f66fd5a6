//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry, orchestrator and HTTP layer produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and the backend liveness gauge)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs and forwarded requests
//! - Metrics stay at simple counters; no latency histograms

pub mod logging;
pub mod metrics;
