//! Weighted (least-used-first) load balancing strategy.
//!
//! Nodes sit in a min-heap keyed by weight. Each pick takes the lightest live
//! node and makes it one heavier, so traffic drifts toward nodes that have
//! been chosen least, while nodes registered with a lower starting weight
//! get a head start.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex, PoisonError};
use crate::load_balancer::{LoadBalancer, backend::BackendNode};

/// Weighted selector.
#[derive(Debug)]
pub struct Weighted {
    /// `(weight, registration index)`; the index breaks ties.
    heap: Mutex<BinaryHeap<Reverse<(u64, usize)>>>,
}

impl Weighted {
    /// Build the heap from the registry's nodes, in registration order.
    pub fn new(backends: &[Arc<BackendNode>]) -> Self {
        let heap = backends
            .iter()
            .enumerate()
            .map(|(index, b)| Reverse((b.weight(), index)))
            .collect();
        Self {
            heap: Mutex::new(heap),
        }
    }
}

impl LoadBalancer for Weighted {
    fn next_server(&self, backends: &[Arc<BackendNode>]) -> Option<Arc<BackendNode>> {
        let mut heap = self.heap.lock().unwrap_or_else(PoisonError::into_inner);
        let mut skipped = Vec::new();
        let mut chosen = None;

        while let Some(Reverse((weight, index))) = heap.pop() {
            let Some(backend) = backends.get(index) else {
                continue;
            };
            if backend.is_alive() {
                let weight = backend.bump_weight();
                heap.push(Reverse((weight, index)));
                chosen = Some(backend.clone());
                break;
            }
            skipped.push(Reverse((weight, index)));
        }

        // Dead nodes are only out of the running for this call.
        heap.extend(skipped);
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn backend(port: u16, weight: u64) -> Arc<BackendNode> {
        let url = Url::parse(&format!("http://127.0.0.1:{}", port)).unwrap();
        Arc::new(BackendNode::new(url, weight))
    }

    #[test]
    fn test_picks_lightest_and_bumps() {
        let backends = vec![backend(8080, 0), backend(8081, 0)];
        let lb = Weighted::new(&backends);

        let s1 = lb.next_server(&backends).unwrap();
        assert_eq!(s1.endpoint(), backends[0].endpoint());
        assert_eq!(backends[0].weight(), 1);

        let s2 = lb.next_server(&backends).unwrap();
        assert_eq!(s2.endpoint(), backends[1].endpoint());

        let s3 = lb.next_server(&backends).unwrap();
        assert_eq!(s3.endpoint(), backends[0].endpoint());
    }

    #[test]
    fn test_lower_starting_weight_gets_head_start() {
        let backends = vec![backend(8080, 3), backend(8081, 0)];
        let lb = Weighted::new(&backends);

        for _ in 0..3 {
            let s = lb.next_server(&backends).unwrap();
            assert_eq!(s.endpoint(), backends[1].endpoint());
        }
        assert_eq!(backends[1].weight(), 3);

        // Now tied at 3: registration order wins.
        let s = lb.next_server(&backends).unwrap();
        assert_eq!(s.endpoint(), backends[0].endpoint());
    }

    #[test]
    fn test_dead_node_not_lost_from_heap() {
        let backends = vec![backend(8080, 0), backend(8081, 5)];
        let lb = Weighted::new(&backends);

        backends[0].set_alive(false);
        let s = lb.next_server(&backends).unwrap();
        assert_eq!(s.endpoint(), backends[1].endpoint());
        assert_eq!(backends[0].weight(), 0);

        // Revived node is still a candidate and is lightest.
        backends[0].set_alive(true);
        let s = lb.next_server(&backends).unwrap();
        assert_eq!(s.endpoint(), backends[0].endpoint());
    }

    #[test]
    fn test_all_dead_returns_none() {
        let backends = vec![backend(8080, 0), backend(8081, 0)];
        let lb = Weighted::new(&backends);
        backends[0].set_alive(false);
        backends[1].set_alive(false);

        assert!(lb.next_server(&backends).is_none());
        assert_eq!(lb.heap.lock().unwrap().len(), 2);
    }
}
