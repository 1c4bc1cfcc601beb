//! The growing type graph: one node per distinct observed type, built
//! under concurrent file ingestion.
//!
//! Nodes are reached only through a stable `u32` index recorded back
//! into the owning [`crate::embedding::EmbeddingEntry`] -- never a raw
//! address -- so that capacity growth never invalidates a reference a
//! worker thread is holding (see design note in the crate root).

use std::sync::Arc;

use parking_lot::Mutex;

use crate::embedding::EmbeddingIndex;

const INITIAL_CAPACITY: usize = 32;

struct NodeState {
    absolute_proportion: u64,
    relative_proportion: f64,
}

/// One distinct type currently active in the graph.
pub struct GraphNode {
    embedding_index: usize,
    num_dimensions: u16,
    /// Reserved for future neighbour-graph use; the measurement driver
    /// never reads it.
    neighbors: Mutex<Vec<u32>>,
    state: Mutex<NodeState>,
}

impl GraphNode {
    fn new(embedding_index: usize, num_dimensions: u16) -> Self {
        Self {
            embedding_index,
            num_dimensions,
            neighbors: Mutex::new(Vec::new()),
            state: Mutex::new(NodeState {
                absolute_proportion: 1,
                relative_proportion: 1.0,
            }),
        }
    }

    pub fn embedding_index(&self) -> usize {
        self.embedding_index
    }

    pub fn num_dimensions(&self) -> u16 {
        self.num_dimensions
    }

    pub fn absolute_proportion(&self) -> u64 {
        self.state.lock().absolute_proportion
    }

    pub fn relative_proportion(&self) -> f64 {
        self.state.lock().relative_proportion
    }

    fn bump(&self) {
        self.state.lock().absolute_proportion += 1;
    }
}

/// A contiguous, amortised-growth sequence of [`GraphNode`]s, one per
/// distinct observed type.
pub struct TypeGraph {
    nodes: Mutex<Vec<Arc<GraphNode>>>,
}

impl Default for TypeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeGraph {
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(Vec::with_capacity(INITIAL_CAPACITY)),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, index: usize) -> Arc<GraphNode> {
        self.nodes.lock()[index].clone()
    }

    /// A stable snapshot of all nodes, taken under the graph lock. Used
    /// by the distance-matrix and diversity layers, which only ever run
    /// after the ingestion threads for a checkpoint have quiesced.
    pub fn snapshot(&self) -> Vec<Arc<GraphNode>> {
        self.nodes.lock().clone()
    }

    /// Records one observation of `key`. Routes unknown keys into the
    /// embedding index's discarded-keys table instead of failing.
    pub fn observe(&self, embeddings: &EmbeddingIndex, key: &str) {
        let Some(entry_index) = embeddings.key_to_index(key) else {
            embeddings.record_discarded(key);
            return;
        };

        let entry = embeddings.entry(entry_index);
        let mut state = entry.lock_state();
        state.occurrence_count += 1;

        if state.active_in_current_graph {
            let node = self.nodes.lock()[state.graph_node_index as usize].clone();
            drop(state);
            node.bump();
            return;
        }

        let mut nodes = self.nodes.lock();
        if nodes.len() == nodes.capacity() {
            let grown = (nodes.capacity() * 2).max(INITIAL_CAPACITY);
            nodes.reserve_exact(grown - nodes.capacity());
        }
        let node_index = nodes.len() as u32;
        nodes.push(Arc::new(GraphNode::new(
            entry_index,
            embeddings.num_dimensions() as u16,
        )));
        drop(nodes);

        state.active_in_current_graph = true;
        state.graph_node_index = node_index;
    }

    /// Sets every node's `relative_proportion = absolute / Σ absolute`
    /// in one pass. Callers must ensure no concurrent `observe` calls
    /// are in flight; this method holds the graph's nodes-mutex for its
    /// entire duration to make that contract enforceable.
    pub fn compute_relative_proportions(&self) {
        let nodes = self.nodes.lock();
        let total: u64 = nodes.iter().map(|n| n.absolute_proportion()).sum();
        for node in nodes.iter() {
            let mut s = node.state.lock();
            s.relative_proportion = if total == 0 {
                0.0
            } else {
                s.absolute_proportion as f64 / total as f64
            };
        }
    }

    /// Relative proportions of every node, in node order. Assumes
    /// [`TypeGraph::compute_relative_proportions`] has already been
    /// called for the current checkpoint.
    pub fn relative_proportions(&self) -> Vec<f64> {
        self.nodes
            .lock()
            .iter()
            .map(|n| n.relative_proportion())
            .collect()
    }

    pub fn absolute_proportions(&self) -> Vec<u64> {
        self.nodes
            .lock()
            .iter()
            .map(|n| n.absolute_proportion())
            .collect()
    }

    /// One atomic checkpoint view: recomputes every node's relative
    /// proportion and reads back the node list, relative proportions and
    /// absolute counts, all under a single acquisition of the nodes
    /// mutex. Unlike calling [`TypeGraph::compute_relative_proportions`],
    /// [`TypeGraph::relative_proportions`], [`TypeGraph::absolute_proportions`]
    /// and [`TypeGraph::snapshot`] separately, this holds the lock across
    /// the whole recompute-then-read sequence, so a concurrent
    /// `observe()` cannot splice a new node in partway through and leave
    /// the three views inconsistent with each other.
    pub fn checkpoint_snapshot(&self) -> CheckpointSnapshot {
        let nodes = self.nodes.lock();
        let total: u64 = nodes.iter().map(|n| n.absolute_proportion()).sum();
        let mut relative = Vec::with_capacity(nodes.len());
        let mut absolute = Vec::with_capacity(nodes.len());
        for node in nodes.iter() {
            let mut s = node.state.lock();
            s.relative_proportion = if total == 0 {
                0.0
            } else {
                s.absolute_proportion as f64 / total as f64
            };
            relative.push(s.relative_proportion);
            absolute.push(s.absolute_proportion);
        }
        CheckpointSnapshot { nodes: nodes.clone(), relative, absolute }
    }
}

/// The consistent triple of node list / relative proportions / absolute
/// counts returned by [`TypeGraph::checkpoint_snapshot`].
pub struct CheckpointSnapshot {
    pub nodes: Vec<Arc<GraphNode>>,
    pub relative: Vec<f64>,
    pub absolute: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn fixture(entries: &[(&str, Vec<f32>)]) -> (tempfile::TempDir, EmbeddingIndex) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.w2v");
        let mut f = File::create(&path).unwrap();
        let dim = entries[0].1.len();
        write!(f, "{} {}\n", entries.len(), dim).unwrap();
        for (key, vec) in entries {
            f.write_all(key.as_bytes()).unwrap();
            f.write_all(b" ").unwrap();
            for v in vec {
                f.write_all(&v.to_le_bytes()).unwrap();
            }
            f.write_all(b"\n").unwrap();
        }
        drop(f);
        let index = EmbeddingIndex::load_word2vec_binary(&path).unwrap();
        (dir, index)
    }

    #[test]
    fn two_type_shannon_scenario_counts() {
        let (_dir, embeddings) = fixture(&[("cat", vec![1.0, 0.0]), ("dog", vec![0.0, 1.0])]);
        let graph = TypeGraph::new();
        for _ in 0..3 {
            graph.observe(&embeddings, "cat");
        }
        graph.observe(&embeddings, "dog");

        graph.compute_relative_proportions();
        assert_eq!(graph.len(), 2);

        let mut props = graph.relative_proportions();
        props.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((props[0] - 0.25).abs() < 1e-9);
        assert!((props[1] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn unknown_keys_are_discarded_not_fatal() {
        let (_dir, embeddings) = fixture(&[("cat", vec![1.0, 0.0])]);
        let graph = TypeGraph::new();
        graph.observe(&embeddings, "cat");
        graph.observe(&embeddings, "giraffe");
        graph.observe(&embeddings, "giraffe");

        assert_eq!(graph.len(), 1);
        let discarded = embeddings.discarded_snapshot();
        assert_eq!(discarded, vec![("giraffe".to_string(), 2)]);
    }

    #[test]
    fn relative_proportions_sum_to_one() {
        let (_dir, embeddings) = fixture(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.0, 1.0]),
            ("c", vec![1.0, 1.0]),
        ]);
        let graph = TypeGraph::new();
        for key in ["a", "b", "a", "c", "a", "b"] {
            graph.observe(&embeddings, key);
        }
        graph.compute_relative_proportions();
        let sum: f64 = graph.relative_proportions().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn checkpoint_snapshot_views_agree_in_length() {
        let (_dir, embeddings) = fixture(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.0, 1.0]),
            ("c", vec![1.0, 1.0]),
        ]);
        let graph = TypeGraph::new();
        for key in ["a", "b", "a", "c", "a", "b"] {
            graph.observe(&embeddings, key);
        }
        let snap = graph.checkpoint_snapshot();
        assert_eq!(snap.nodes.len(), snap.relative.len());
        assert_eq!(snap.nodes.len(), snap.absolute.len());
        let sum: f64 = snap.relative.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn capacity_growth_preserves_all_nodes() {
        let entries: Vec<(String, Vec<f32>)> = (0..80)
            .map(|i| (format!("key{i}"), vec![i as f32, (i * 2) as f32]))
            .collect();
        let borrowed: Vec<(&str, Vec<f32>)> =
            entries.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        let (_dir, embeddings) = fixture(&borrowed);

        let graph = TypeGraph::new();
        for (key, _) in &borrowed {
            graph.observe(&embeddings, key);
        }
        assert_eq!(graph.len(), 80);
        for i in 0..80 {
            let idx = embeddings.key_to_index(&format!("key{i}")).unwrap();
            let state = embeddings.entry(idx).lock_state();
            assert!(state.active_in_current_graph);
            let node = graph.node(state.graph_node_index as usize);
            assert_eq!(node.embedding_index(), idx);
        }
    }
}
