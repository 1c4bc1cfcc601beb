//! Single-pass streaming aggregators for pairwise, Stirling, and
//! Leinster-Cobbold diversity: each consumes one row of cosine
//! distances at a time (as produced by
//! [`crate::matrix::DistanceRowEngine::compute_row_batch`]) instead of
//! requiring a materialised [`crate::matrix::DistanceMatrix`], so a
//! checkpoint need not hold the full `n*n` matrix in memory to report
//! these three indices.

use super::disparity::hill_like_transform;

/// Accumulates `(2 / (n*(n-1))) * sum_{i<j} d_ij` one row at a time.
pub struct PairwiseAggregator {
    n: usize,
    sum: f64,
}

impl PairwiseAggregator {
    pub fn new(n: usize) -> Self {
        Self { n, sum: 0.0 }
    }

    /// `row` must be the full cosine-distance row for node `i` against
    /// every node `0..n`.
    pub fn accumulate_row(&mut self, i: usize, row: &[f32]) {
        for j in (i + 1)..self.n {
            self.sum += row[j] as f64;
        }
    }

    pub fn finalize(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        self.sum * 2.0 / (self.n as f64 * (self.n as f64 - 1.0))
    }
}

/// Accumulates Stirling's `sum_{i != j} d_ij^alpha * (p_i * p_j)^beta`
/// one row at a time.
pub struct StirlingAggregator<'a> {
    p: &'a [f64],
    alpha: f64,
    beta: f64,
    sum: f64,
}

impl<'a> StirlingAggregator<'a> {
    pub fn new(p: &'a [f64], alpha: f64, beta: f64) -> Self {
        Self {
            p,
            alpha,
            beta,
            sum: 0.0,
        }
    }

    pub fn accumulate_row(&mut self, i: usize, row: &[f32]) {
        for (j, &d) in row.iter().enumerate() {
            if i == j {
                continue;
            }
            self.sum += (d as f64).powf(self.alpha) * (self.p[i] * self.p[j]).powf(self.beta);
        }
    }

    pub fn finalize(&self) -> f64 {
        self.sum
    }
}

/// Accumulates the per-node similarity aggregates `sum_j p_j *
/// exp(-d_ij)` that the Leinster-Cobbold Hill-number transform needs,
/// one row at a time, then applies the same transform the full-matrix
/// variant uses.
pub struct LeinsterCobboldAggregator<'a> {
    p: &'a [f64],
    alpha: f64,
    aggregates: Vec<f64>,
}

impl<'a> LeinsterCobboldAggregator<'a> {
    pub fn new(p: &'a [f64], alpha: f64) -> Self {
        Self {
            p,
            alpha,
            aggregates: vec![0.0; p.len()],
        }
    }

    pub fn accumulate_row(&mut self, i: usize, row: &[f32]) {
        let aggregate: f64 = row
            .iter()
            .enumerate()
            .map(|(j, &d)| self.p[j] * (-(d as f64)).exp())
            .sum();
        self.aggregates[i] = aggregate;
    }

    pub fn finalize(&self) -> f64 {
        hill_like_transform(&self.aggregates, self.p, self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diversity::disparity;
    use crate::embedding::EmbeddingIndex;
    use crate::graph::TypeGraph;
    use crate::matrix::DistanceRowEngine;
    use crate::FpMode;
    use std::fs::File;
    use std::io::Write;

    fn fixture() -> (tempfile::TempDir, EmbeddingIndex, TypeGraph) {
        let entries = [
            ("a", vec![1.0_f32, 0.0, 0.0]),
            ("b", vec![0.0, 1.0, 0.0]),
            ("c", vec![0.0, 0.0, 1.0]),
            ("d", vec![0.5, 0.5, 0.5]),
            ("e", vec![0.2, 0.8, 0.1]),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.w2v");
        let mut f = File::create(&path).unwrap();
        write!(f, "{} {}\n", entries.len(), 3).unwrap();
        for (key, vec) in &entries {
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
        for (key, _) in &entries {
            graph.observe(&embeddings, key);
        }
        graph.compute_relative_proportions();
        (dir, embeddings, graph)
    }

    #[test]
    fn iterative_pairwise_agrees_with_full_matrix() {
        let (_dir, embeddings, graph) = fixture();
        let engine = DistanceRowEngine::new(&graph, &embeddings);
        let nodes = graph.snapshot();
        let n = nodes.len();

        let matrix = engine.compute_full_matrix(FpMode::Fp64, 2).unwrap();
        let from_matrix = disparity::pairwise_mean_distance(&matrix);

        let mut aggregator = PairwiseAggregator::new(n);
        let mut row = vec![0.0_f32; n];
        for i in 0..n {
            engine.compute_row(&nodes, i, &mut row);
            aggregator.accumulate_row(i, &row);
        }
        let from_iterative = aggregator.finalize();

        assert!((from_matrix - from_iterative).abs() < 1e-6);
    }

    #[test]
    fn iterative_stirling_agrees_with_full_matrix() {
        let (_dir, embeddings, graph) = fixture();
        let engine = DistanceRowEngine::new(&graph, &embeddings);
        let nodes = graph.snapshot();
        let n = nodes.len();
        let p = graph.relative_proportions();

        let matrix = engine.compute_full_matrix(FpMode::Fp64, 2).unwrap();
        let from_matrix = disparity::stirling(&p, &matrix, 1.0, 1.0);

        let mut aggregator = StirlingAggregator::new(&p, 1.0, 1.0);
        let mut row = vec![0.0_f32; n];
        for i in 0..n {
            engine.compute_row(&nodes, i, &mut row);
            aggregator.accumulate_row(i, &row);
        }
        assert!((from_matrix - aggregator.finalize()).abs() < 1e-5);
    }

    #[test]
    fn iterative_leinster_cobbold_agrees_with_full_matrix() {
        let (_dir, embeddings, graph) = fixture();
        let engine = DistanceRowEngine::new(&graph, &embeddings);
        let nodes = graph.snapshot();
        let n = nodes.len();
        let p = graph.relative_proportions();

        let matrix = engine.compute_full_matrix(FpMode::Fp64, 2).unwrap();
        let from_matrix = disparity::leinster_cobbold(&p, &matrix, 2.0);

        let mut aggregator = LeinsterCobboldAggregator::new(&p, 2.0);
        let mut row = vec![0.0_f32; n];
        for i in 0..n {
            engine.compute_row(&nodes, i, &mut row);
            aggregator.accumulate_row(i, &row);
        }
        assert!((from_matrix - aggregator.finalize()).abs() < 1e-5);
    }
}
