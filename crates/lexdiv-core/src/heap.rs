//! A min-heap over all `n*(n-1)/2` pairwise distances, with lazy pop.
//!
//! Popping a slot does not compact the array: it is tagged dead and the
//! resulting hole is sifted down by repeatedly promoting the smaller of
//! its two still-usable children, so the heap property over usable
//! entries is preserved without ever shifting the rest of the array.
//! This is what lets the MST builder (§4.H) pop interior slots found by
//! its crossing-edge search, not just the root.

use crate::matrix::DistanceMatrix;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub node_a: u32,
    pub node_b: u32,
    pub distance: f64,
}

#[derive(Clone, Debug)]
enum Slot {
    Live(Edge),
    Dead,
}

pub struct DistanceHeap {
    slots: Vec<Slot>,
}

impl DistanceHeap {
    /// Builds the heap over all `n*(n-1)/2` unordered pairs, drawing
    /// each distance from `distance_fn(i, j)`.
    pub fn build(n: usize, mut distance_fn: impl FnMut(usize, usize) -> f64) -> Self {
        let capacity = n.saturating_sub(1) * n / 2;
        let mut slots = Vec::with_capacity(capacity);
        for i in 0..n {
            for j in (i + 1)..n {
                slots.push(Slot::Live(Edge {
                    node_a: i as u32,
                    node_b: j as u32,
                    distance: distance_fn(i, j),
                }));
            }
        }
        let len = slots.len();
        if len > 1 {
            for start in (0..len / 2).rev() {
                Self::sift_down_build(&mut slots, start, len);
            }
        }
        Self { slots }
    }

    /// Builds the heap by reading every pair directly out of a
    /// precomputed [`DistanceMatrix`] rather than recomputing
    /// distances.
    pub fn from_matrix(matrix: &DistanceMatrix) -> Self {
        Self::build(matrix.n(), |i, j| matrix.get_f64(i, j))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_usable(&self, idx: usize) -> bool {
        matches!(self.slots.get(idx), Some(Slot::Live(_)))
    }

    pub fn edge_at(&self, idx: usize) -> Option<Edge> {
        match self.slots.get(idx) {
            Some(Slot::Live(e)) => Some(*e),
            _ => None,
        }
    }

    pub fn root_edge(&self) -> Option<Edge> {
        self.edge_at(0)
    }

    fn children(idx: usize) -> (usize, usize) {
        (2 * idx + 1, 2 * idx + 2)
    }

    fn dist(slot: &Slot) -> f64 {
        match slot {
            Slot::Live(e) => e.distance,
            Slot::Dead => f64::INFINITY,
        }
    }

    fn sift_down_build(slots: &mut [Slot], mut idx: usize, len: usize) {
        loop {
            let (l, r) = Self::children(idx);
            let mut smallest = idx;
            if l < len && Self::dist(&slots[l]) < Self::dist(&slots[smallest]) {
                smallest = l;
            }
            if r < len && Self::dist(&slots[r]) < Self::dist(&slots[smallest]) {
                smallest = r;
            }
            if smallest == idx {
                break;
            }
            slots.swap(idx, smallest);
            idx = smallest;
        }
    }

    /// Pops the edge at `idx`, marking it dead, and sifts the
    /// resulting hole down to restore the heap property over usable
    /// entries. Returns the popped edge, or `None` if `idx` is out of
    /// range or already dead.
    pub fn pop_min(&mut self, idx: usize) -> Option<Edge> {
        let popped = match self.slots.get(idx) {
            Some(Slot::Live(e)) => *e,
            _ => return None,
        };

        let mut hole = idx;
        self.slots[hole] = Slot::Dead;
        loop {
            let (l, r) = Self::children(hole);
            let left = if l < self.slots.len() { self.edge_at(l) } else { None };
            let right = if r < self.slots.len() { self.edge_at(r) } else { None };
            let chosen = match (left, right) {
                (Some(le), Some(re)) if le.distance <= re.distance => Some((l, le)),
                (Some(_), Some(re)) => Some((r, re)),
                (Some(le), None) => Some((l, le)),
                (None, Some(re)) => Some((r, re)),
                (None, None) => None,
            };
            match chosen {
                None => break,
                Some((child_idx, edge)) => {
                    self.slots[hole] = Slot::Live(edge);
                    self.slots[child_idx] = Slot::Dead;
                    hole = child_idx;
                }
            }
        }

        Some(popped)
    }

    /// Debug/test helper: true iff every usable slot's distance is
    /// `<=` both of its usable children's distances.
    pub fn satisfies_heap_property(&self) -> bool {
        for idx in 0..self.slots.len() {
            let Slot::Live(parent) = &self.slots[idx] else {
                continue;
            };
            let (l, r) = Self::children(idx);
            if let Some(Slot::Live(child)) = self.slots.get(l) {
                if parent.distance > child.distance {
                    return false;
                }
            }
            if let Some(Slot::Live(child)) = self.slots.get(r) {
                if parent.distance > child.distance {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_heap() -> DistanceHeap {
        let dists = [
            (0, 1, 0.4),
            (0, 2, 0.9),
            (0, 3, 0.2),
            (1, 2, 0.5),
            (1, 3, 0.7),
            (2, 3, 0.1),
        ];
        DistanceHeap::build(4, |i, j| {
            dists
                .iter()
                .find(|&&(a, b, _)| (a, b) == (i, j))
                .map(|&(_, _, d)| d)
                .unwrap()
        })
    }

    #[test]
    fn heapify_builds_a_valid_heap() {
        let heap = sample_heap();
        assert_eq!(heap.len(), 6);
        assert!(heap.satisfies_heap_property());
    }

    #[test]
    fn repeated_root_pops_are_nondecreasing() {
        let mut heap = sample_heap();
        let mut last = f64::NEG_INFINITY;
        while let Some(edge) = heap.pop_min(0) {
            assert!(edge.distance >= last - 1e-12);
            last = edge.distance;
            assert!(heap.satisfies_heap_property());
        }
        assert_eq!(heap.len(), 6);
        for idx in 0..heap.len() {
            assert!(!heap.is_usable(idx));
        }
    }

    #[test]
    fn popping_interior_slot_preserves_heap_property() {
        let mut heap = sample_heap();
        heap.pop_min(2);
        assert!(heap.satisfies_heap_property());
        assert_eq!(heap.len(), 6);
    }

    #[test]
    fn double_pop_of_same_slot_is_noop() {
        let mut heap = sample_heap();
        assert!(heap.pop_min(0).is_some());
        assert!(heap.pop_min(0).is_none());
    }
}
