//! Backend registry.
//!
//! # Responsibilities
//! - Own the fixed, ordered list of backends
//! - Apply the configured selection policy
//! - Mark backends alive or dead by endpoint

use std::sync::Arc;
use thiserror::Error;
use url::Url;
use crate::config::{BackendConfig, BalancingPolicy};
use crate::load_balancer::{
    LoadBalancer,
    backend::BackendNode,
    round_robin::RoundRobin,
    weighted::Weighted,
};
use crate::observability::metrics;

/// Errors raised while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no backends configured")]
    Empty,
    #[error("invalid backend url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug)]
enum Selector {
    RoundRobin(RoundRobin),
    Weighted(Weighted),
}

impl Selector {
    fn as_balancer(&self) -> &dyn LoadBalancer {
        match self {
            Selector::RoundRobin(rr) => rr,
            Selector::Weighted(w) => w,
        }
    }
}

/// The set of backends every request selects from.
#[derive(Debug)]
pub struct BackendRegistry {
    nodes: Vec<Arc<BackendNode>>,
    selector: Selector,
}

impl BackendRegistry {
    /// Create a registry from configuration.
    pub fn new(configs: &[BackendConfig], policy: BalancingPolicy) -> Result<Self, RegistryError> {
        let nodes = configs
            .iter()
            .map(|config| {
                let endpoint = Url::parse(&config.url).map_err(|source| RegistryError::InvalidUrl {
                    url: config.url.clone(),
                    source,
                })?;
                if let Some(host) = &config.host {
                    tracing::debug!(host = %host, endpoint = %endpoint, "Resolved backend");
                }
                Ok(Arc::new(BackendNode::new(endpoint, config.weight)))
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;
        Self::from_nodes(nodes, policy)
    }

    /// Create a registry from endpoints, all starting at weight 0.
    pub fn from_endpoints(
        endpoints: impl IntoIterator<Item = Url>,
        policy: BalancingPolicy,
    ) -> Result<Self, RegistryError> {
        let nodes = endpoints
            .into_iter()
            .map(|endpoint| Arc::new(BackendNode::new(endpoint, 0)))
            .collect();
        Self::from_nodes(nodes, policy)
    }

    fn from_nodes(nodes: Vec<Arc<BackendNode>>, policy: BalancingPolicy) -> Result<Self, RegistryError> {
        if nodes.is_empty() {
            return Err(RegistryError::Empty);
        }

        let selector = match policy {
            BalancingPolicy::RoundRobin => Selector::RoundRobin(RoundRobin::new()),
            BalancingPolicy::Weighted => Selector::Weighted(Weighted::new(&nodes)),
        };

        for node in &nodes {
            tracing::info!(endpoint = %node.endpoint(), weight = node.weight(), "Registered backend");
            metrics::record_backend_alive(node.endpoint().as_str(), true);
        }

        Ok(Self { nodes, selector })
    }

    /// Select the next live backend, or `None` when every backend is dead.
    pub fn next_peer(&self) -> Option<Arc<BackendNode>> {
        let peer = self.selector.as_balancer().next_server(&self.nodes);
        match &peer {
            Some(node) => tracing::debug!(endpoint = %node.endpoint(), "Selected backend"),
            None => tracing::debug!(backend_count = self.nodes.len(), "No live backends"),
        }
        peer
    }

    /// Set the health of the backend with the given endpoint.
    ///
    /// Returns false when no backend has that endpoint.
    pub fn mark(&self, endpoint: &Url, alive: bool) -> bool {
        let Some(node) = self.nodes.iter().find(|n| n.endpoint() == endpoint) else {
            tracing::debug!(endpoint = %endpoint, "Mark ignored for unknown backend");
            return false;
        };

        if node.is_alive() != alive {
            tracing::warn!(endpoint = %endpoint, alive, "Backend health changed");
        }
        node.set_alive(alive);
        metrics::record_backend_alive(endpoint.as_str(), alive);
        true
    }

    /// All backends, in registration order.
    pub fn nodes(&self) -> &[Arc<BackendNode>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of backends not marked dead.
    pub fn alive_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_alive()).count()
    }

    /// Round-robin cursor position; `None` under the weighted policy.
    pub fn cursor(&self) -> Option<u64> {
        match &self.selector {
            Selector::RoundRobin(rr) => Some(rr.cursor()),
            Selector::Weighted(_) => None,
        }
    }
}
