//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request needs a peer
//!     → pool.rs (registry of backends)
//!     → Apply selection policy:
//!         - round_robin.rs (shared cursor, skip dead nodes)
//!         - weighted.rs (lightest live node first)
//!     → backend.rs (endpoint + health/weight)
//!     → Return live backend or None
//! ```
//!
//! # Design Decisions
//! - The node list is fixed after startup; no locking to iterate it
//! - Health is per node, behind the node's own lock
//! - Round-robin uses a single atomic cursor, never a pool-wide lock

use std::sync::Arc;

pub mod backend;
pub mod pool;
pub mod round_robin;
pub mod weighted;

pub use backend::BackendNode;
pub use pool::{BackendRegistry, RegistryError};

/// A peer selection strategy over a fixed backend list.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick a live backend, or `None` when every backend is dead.
    fn next_server(&self, backends: &[Arc<BackendNode>]) -> Option<Arc<BackendNode>>;
}
