//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use crate::load_balancer::{LoadBalancer, backend::BackendNode};

/// Round-robin selector.
/// Stores a shared cursor that only ever advances.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicU64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of steps the cursor has advanced.
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, backends: &[Arc<BackendNode>]) -> Option<Arc<BackendNode>> {
        if backends.is_empty() {
            return None;
        }

        let len = backends.len() as u64;
        let start = self.cursor.fetch_add(1, Ordering::AcqRel).wrapping_add(1);

        for offset in 0..len {
            let index = (start.wrapping_add(offset) % len) as usize;
            let backend = &backends[index];
            if backend.is_alive() {
                // Skipped dead nodes: move the cursor onto the chosen one.
                if offset > 0 {
                    self.cursor.fetch_add(offset, Ordering::AcqRel);
                }
                return Some(backend.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn backends(n: usize) -> Vec<Arc<BackendNode>> {
        (0..n)
            .map(|i| {
                let url = Url::parse(&format!("http://127.0.0.1:{}", 8080 + i)).unwrap();
                Arc::new(BackendNode::new(url, 0))
            })
            .collect()
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let backends = backends(2);

        // The first call lands one past the initial cursor.
        let s1 = lb.next_server(&backends).unwrap();
        assert_eq!(s1.endpoint(), backends[1].endpoint());

        let s2 = lb.next_server(&backends).unwrap();
        assert_eq!(s2.endpoint(), backends[0].endpoint());

        let s3 = lb.next_server(&backends).unwrap();
        assert_eq!(s3.endpoint(), backends[1].endpoint());
        assert_eq!(lb.cursor(), 3);
    }

    #[test]
    fn test_skips_dead_and_advances_cursor() {
        let lb = RoundRobin::new();
        let backends = backends(3);
        backends[1].set_alive(false);

        // start = 1 (dead) -> 2
        let s1 = lb.next_server(&backends).unwrap();
        assert_eq!(s1.endpoint(), backends[2].endpoint());
        assert_eq!(lb.cursor() % 3, 2);

        // continues after the chosen node
        let s2 = lb.next_server(&backends).unwrap();
        assert_eq!(s2.endpoint(), backends[0].endpoint());
    }

    #[test]
    fn test_all_dead_returns_none() {
        let lb = RoundRobin::new();
        let backends = backends(3);
        for b in &backends {
            b.set_alive(false);
        }
        assert!(lb.next_server(&backends).is_none());
    }

    #[test]
    fn test_empty_returns_none() {
        let lb = RoundRobin::new();
        assert!(lb.next_server(&[]).is_none());
        assert_eq!(lb.cursor(), 0);
    }

    #[test]
    fn test_visits_every_live_node_within_n_calls() {
        let lb = RoundRobin::new();
        let backends = backends(5);
        backends[0].set_alive(false);
        backends[3].set_alive(false);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..backends.len() {
            let b = lb.next_server(&backends).unwrap();
            assert!(b.is_alive());
            seen.insert(b.endpoint().clone());
        }
        assert_eq!(seen.len(), 3);
    }
}
