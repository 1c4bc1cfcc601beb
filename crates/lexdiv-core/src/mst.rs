//! Prim-style minimum spanning tree, built by repeated "cheapest
//! crossing edge" queries against a [`DistanceHeap`].
//!
//! The original source locates each crossing edge with a recursion
//! that prunes subtrees once a candidate distance is known. Reimplemented
//! here with an explicit stack rather than recursion, since the
//! recursion depth tracks heap depth (`log2` of `n*(n-1)/2`) and an
//! adversarial input has no bound on how often the worst case repeats.

use crate::heap::{DistanceHeap, Edge};

pub struct MinimumSpanningTree {
    pub edges: Vec<Edge>,
    /// Node indices in the order they joined the tree; `node_order[0]`
    /// and `node_order[1]` are the initial edge's endpoints.
    pub node_order: Vec<u32>,
}

impl MinimumSpanningTree {
    /// Consumes crossing edges out of `heap` (via lazy pop) until every
    /// one of `n` nodes has joined the tree.
    pub fn build(n: usize, heap: &mut DistanceHeap) -> Self {
        let mut considered = vec![false; n];
        let mut node_order = Vec::with_capacity(n);
        let mut edges = Vec::with_capacity(n.saturating_sub(1));

        if n == 0 {
            return Self { edges, node_order };
        }
        if n == 1 {
            node_order.push(0);
            return Self { edges, node_order };
        }

        let root = heap
            .pop_min(0)
            .expect("a heap built over n >= 2 nodes has a root edge");
        considered[root.node_a as usize] = true;
        considered[root.node_b as usize] = true;
        node_order.push(root.node_a);
        node_order.push(root.node_b);
        edges.push(root);

        let mut num_active = 2;
        while num_active < n {
            let idx = Self::find_minimum_acceptable_arc(heap, &considered)
                .expect("the node set is fully connected, so a crossing edge always exists");
            let edge = heap
                .edge_at(idx)
                .expect("the candidate slot found above is still live");

            let new_node = if considered[edge.node_a as usize] {
                edge.node_b
            } else {
                edge.node_a
            };
            considered[new_node as usize] = true;
            node_order.push(new_node);
            edges.push(edge);

            heap.pop_min(idx);
            num_active += 1;
        }

        Self { edges, node_order }
    }

    /// Depth-first search over the heap's array layout for the
    /// minimum-distance slot whose edge has exactly one endpoint
    /// already in `considered`. Prunes a subtree as soon as its root's
    /// distance exceeds the best candidate found so far -- sound
    /// because the heap property guarantees every descendant's
    /// distance is at least its ancestors'.
    fn find_minimum_acceptable_arc(heap: &DistanceHeap, considered: &[bool]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        let mut stack = vec![0usize];

        while let Some(idx) = stack.pop() {
            let Some(edge) = heap.edge_at(idx) else {
                continue;
            };
            if let Some((_, best_distance)) = best {
                if edge.distance > best_distance {
                    continue;
                }
            }

            let a_in = considered[edge.node_a as usize];
            let b_in = considered[edge.node_b as usize];
            if a_in != b_in {
                let better = best.map(|(_, d)| edge.distance < d).unwrap_or(true);
                if better {
                    best = Some((idx, edge.distance));
                }
            }

            stack.push(2 * idx + 1);
            stack.push(2 * idx + 2);
        }

        best.map(|(idx, _)| idx)
    }

    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.distance).sum()
    }
}
