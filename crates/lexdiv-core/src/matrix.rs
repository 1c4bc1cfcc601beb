//! Dense pairwise distance matrix and the parallel row engine that
//! fills it.
//!
//! A matrix is rebuilt fresh for every checkpoint and released once the
//! checkpoint's diversity indices have consumed it -- there is no
//! persistence across checkpoints.

use std::sync::Arc;

use rayon::prelude::*;

use crate::embedding::EmbeddingIndex;
use crate::graph::{GraphNode, TypeGraph};
use crate::{Error, FpMode, Result};

/// A dense n*n distance matrix, stored in either f32 (disparity
/// indices) or f64 (the MST builder, which needs the extra precision
/// for stable tie-breaking) depending on the requested [`FpMode`].
///
/// Two parallel bitmaps, `active` and `active_final`, track which rows
/// the MST builder still considers live -- unused outside that
/// consumer, but carried on every matrix since construction is
/// per-checkpoint and cheap either way.
pub enum DistanceMatrix {
    F32 {
        n: usize,
        data: Vec<f32>,
        active: Vec<bool>,
        active_final: Vec<bool>,
    },
    F64 {
        n: usize,
        data: Vec<f64>,
        active: Vec<bool>,
        active_final: Vec<bool>,
    },
}

impl DistanceMatrix {
    fn zeroed(n: usize, fp_mode: FpMode) -> Self {
        match fp_mode {
            FpMode::Fp32 => Self::F32 {
                n,
                data: vec![0.0_f32; n * n],
                active: vec![true; n],
                active_final: vec![false; n],
            },
            FpMode::Fp64 => Self::F64 {
                n,
                data: vec![0.0_f64; n * n],
                active: vec![true; n],
                active_final: vec![false; n],
            },
        }
    }

    pub fn n(&self) -> usize {
        match self {
            Self::F32 { n, .. } | Self::F64 { n, .. } => *n,
        }
    }

    pub fn get_f32(&self, i: usize, j: usize) -> f32 {
        match self {
            Self::F32 { n, data, .. } => data[i * n + j],
            Self::F64 { n, data, .. } => data[i * n + j] as f32,
        }
    }

    pub fn get_f64(&self, i: usize, j: usize) -> f64 {
        match self {
            Self::F32 { n, data, .. } => data[i * n + j] as f64,
            Self::F64 { n, data, .. } => data[i * n + j],
        }
    }

    fn set_f64(&mut self, i: usize, j: usize, value: f64) {
        match self {
            Self::F32 { n, data, .. } => data[i * *n + j] = value as f32,
            Self::F64 { n, data, .. } => data[i * *n + j] = value,
        }
    }

    pub fn is_active(&self, i: usize) -> bool {
        match self {
            Self::F32 { active, .. } | Self::F64 { active, .. } => active[i],
        }
    }

    pub fn set_active(&mut self, i: usize, value: bool) {
        match self {
            Self::F32 { active, .. } | Self::F64 { active, .. } => active[i] = value,
        }
    }

    pub fn is_active_final(&self, i: usize) -> bool {
        match self {
            Self::F32 { active_final, .. } | Self::F64 { active_final, .. } => active_final[i],
        }
    }

    pub fn set_active_final(&mut self, i: usize, value: bool) {
        match self {
            Self::F32 { active_final, .. } | Self::F64 { active_final, .. } => {
                active_final[i] = value
            }
        }
    }
}

/// Computes cosine-distance rows for the current graph snapshot,
/// either as a full parallel matrix, a single row, or a batch of rows
/// shared across a thread pool (the shape the iterative diversity
/// aggregators consume).
pub struct DistanceRowEngine<'a> {
    graph: &'a TypeGraph,
    embeddings: &'a EmbeddingIndex,
}

impl<'a> DistanceRowEngine<'a> {
    pub fn new(graph: &'a TypeGraph, embeddings: &'a EmbeddingIndex) -> Self {
        Self { graph, embeddings }
    }

    fn vector_for(&self, nodes: &[Arc<GraphNode>], i: usize) -> &[f32] {
        self.embeddings.vector(nodes[i].embedding_index())
    }

    /// Single-threaded cosine distance from node `i` to every node in
    /// `nodes`. `out.len()` must equal `nodes.len()`.
    pub fn compute_row(&self, nodes: &[Arc<GraphNode>], i: usize, out: &mut [f32]) {
        debug_assert_eq!(out.len(), nodes.len());
        let vi = self.vector_for(nodes, i);
        for j in 0..nodes.len() {
            out[j] = if i == j {
                0.0
            } else {
                crate::distance::cosine_distance(vi, self.vector_for(nodes, j))
            };
        }
    }

    /// Produces `batch` consecutive rows starting at `i_start`,
    /// sharing `num_threads` across the batch. `out` must hold
    /// `batch * nodes.len()` elements, row-major. Requires `batch <=
    /// num_threads`.
    pub fn compute_row_batch(
        &self,
        nodes: &[Arc<GraphNode>],
        i_start: usize,
        batch: usize,
        num_threads: usize,
        out: &mut [f32],
    ) -> Result<()> {
        if batch > num_threads {
            return Err(Error::LogicInvariant(format!(
                "row batch of {batch} exceeds the {num_threads} threads sharing it"
            )));
        }
        let n = nodes.len();
        debug_assert_eq!(out.len(), batch * n);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| Error::ThreadSpawn(e.to_string()))?;

        pool.install(|| {
            out.par_chunks_mut(n)
                .enumerate()
                .take(batch)
                .for_each(|(b, row_out)| {
                    self.compute_row(nodes, i_start + b, row_out);
                });
        });
        Ok(())
    }

    /// Partitions `[0, n)` round-robin across `num_threads` threads;
    /// each thread fills the upper triangle for its assigned rows and
    /// the result is mirrored into the lower triangle. The diagonal is
    /// zero.
    pub fn compute_full_matrix(&self, fp_mode: FpMode, num_threads: usize) -> Result<DistanceMatrix> {
        let nodes = self.graph.snapshot();
        let n = nodes.len();
        let mut matrix = DistanceMatrix::zeroed(n, fp_mode);
        if n == 0 {
            return Ok(matrix);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads.max(1))
            .build()
            .map_err(|e| Error::ThreadSpawn(e.to_string()))?;

        let upper_rows: Vec<Vec<f32>> = pool.install(|| {
            (0..n)
                .into_par_iter()
                .map(|i| {
                    let vi = self.vector_for(&nodes, i);
                    (i..n)
                        .map(|j| {
                            if i == j {
                                0.0
                            } else {
                                crate::distance::cosine_distance(vi, self.vector_for(&nodes, j))
                            }
                        })
                        .collect()
                })
                .collect()
        });

        for (i, row) in upper_rows.iter().enumerate() {
            for (k, &d) in row.iter().enumerate() {
                let j = i + k;
                let d = d as f64;
                matrix.set_f64(i, j, d);
                matrix.set_f64(j, i, d);
            }
        }

        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingIndex;
    use std::fs::File;
    use std::io::Write;

    fn fixture(entries: &[(&str, Vec<f32>)]) -> (tempfile::TempDir, EmbeddingIndex, TypeGraph) {
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
        let embeddings = EmbeddingIndex::load_word2vec_binary(&path).unwrap();
        let graph = TypeGraph::new();
        for (key, _) in entries {
            graph.observe(&embeddings, key);
        }
        (dir, embeddings, graph)
    }

    #[test]
    fn full_matrix_is_symmetric_with_zero_diagonal_and_bounded_entries() {
        let (_dir, embeddings, graph) = fixture(&[
            ("a", vec![1.0, 0.0, 0.0]),
            ("b", vec![0.0, 1.0, 0.0]),
            ("c", vec![1.0, 1.0, 0.0]),
            ("d", vec![0.5, 0.5, 0.5]),
        ]);
        let engine = DistanceRowEngine::new(&graph, &embeddings);
        let matrix = engine.compute_full_matrix(FpMode::Fp32, 2).unwrap();

        for i in 0..matrix.n() {
            assert_eq!(matrix.get_f64(i, i), 0.0);
            for j in 0..matrix.n() {
                assert!((matrix.get_f64(i, j) - matrix.get_f64(j, i)).abs() < 1e-9);
                assert!((0.0..=2.0).contains(&matrix.get_f64(i, j)));
            }
        }
    }

    #[test]
    fn compute_row_matches_full_matrix_row() {
        let (_dir, embeddings, graph) = fixture(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.3, 0.7]),
            ("c", vec![0.0, 1.0]),
        ]);
        let engine = DistanceRowEngine::new(&graph, &embeddings);
        let nodes = graph.snapshot();
        let matrix = engine.compute_full_matrix(FpMode::Fp32, 1).unwrap();

        let mut row = vec![0.0_f32; nodes.len()];
        engine.compute_row(&nodes, 1, &mut row);
        for j in 0..nodes.len() {
            assert!((row[j] - matrix.get_f32(1, j)).abs() < 1e-6);
        }
    }

    #[test]
    fn row_batch_rejects_batch_larger_than_threads() {
        let (_dir, embeddings, graph) = fixture(&[("a", vec![1.0]), ("b", vec![0.5])]);
        let engine = DistanceRowEngine::new(&graph, &embeddings);
        let nodes = graph.snapshot();
        let mut out = vec![0.0_f32; 4];
        assert!(engine.compute_row_batch(&nodes, 0, 4, 2, &mut out).is_err());
    }

    #[test]
    fn row_batch_agrees_with_single_row_computation() {
        let (_dir, embeddings, graph) = fixture(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.2, 0.8]),
            ("c", vec![0.0, 1.0]),
            ("d", vec![0.6, 0.4]),
        ]);
        let engine = DistanceRowEngine::new(&graph, &embeddings);
        let nodes = graph.snapshot();
        let n = nodes.len();

        let mut batch_out = vec![0.0_f32; 2 * n];
        engine.compute_row_batch(&nodes, 0, 2, 2, &mut batch_out).unwrap();

        for i in 0..2 {
            let mut row = vec![0.0_f32; n];
            engine.compute_row(&nodes, i, &mut row);
            assert_eq!(&batch_out[i * n..(i + 1) * n], row.as_slice());
        }
    }
}
