//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend endpoint
//! - Track health state (alive / dead)
//! - Track selection weight (for the weighted policy)
//!
//! # Design Decisions
//! - Health and weight sit behind the node's own lock, never a pool-wide one
//! - Only the registry mutates them; outside the crate they are read-only

use std::sync::{PoisonError, RwLock};
use url::Url;

#[derive(Debug)]
struct NodeState {
    alive: bool,
    weight: u64,
}

/// A single backend server.
#[derive(Debug)]
pub struct BackendNode {
    endpoint: Url,
    state: RwLock<NodeState>,
}

impl BackendNode {
    /// Create a new backend, alive, with the given starting weight.
    pub fn new(endpoint: Url, weight: u64) -> Self {
        Self {
            endpoint,
            state: RwLock::new(NodeState {
                alive: true,
                weight,
            }),
        }
    }

    /// The endpoint the forwarder targets.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Return true if the backend has not been marked dead.
    pub fn is_alive(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .alive
    }

    /// Current selection weight.
    pub fn weight(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .weight
    }

    pub(crate) fn set_alive(&self, alive: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .alive = alive;
    }

    /// Bump the weight by one and return the new value.
    pub(crate) fn bump_weight(&self) -> u64 {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.weight = state.weight.saturating_add(1);
        state.weight
    }
}
