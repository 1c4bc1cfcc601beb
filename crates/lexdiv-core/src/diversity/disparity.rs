//! Distance-weighted ("disparity") diversity indices. Each function
//! consumes the type graph's relative proportions together with either
//! a computed [`DistanceMatrix`] or (for the two indices that need an
//! actual centroid in embedding space) the raw embedding vectors.

use crate::matrix::DistanceMatrix;
use crate::mst::MinimumSpanningTree;

/// `(2 / (n*(n-1))) * sum_{i<j} d_ij`.
pub fn pairwise_mean_distance(matrix: &DistanceMatrix) -> f64 {
    let n = matrix.n();
    if n < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += matrix.get_f64(i, j);
        }
    }
    sum * 2.0 / (n as f64 * (n as f64 - 1.0))
}

/// Stirling's (alpha, beta) diversity: `sum_{i != j} d_ij^alpha * (p_i
/// * p_j)^beta`.
pub fn stirling(p: &[f64], matrix: &DistanceMatrix, alpha: f64, beta: f64) -> f64 {
    let n = p.len();
    let mut sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            sum += matrix.get_f64(i, j).powf(alpha) * (p[i] * p[j]).powf(beta);
        }
    }
    sum
}

fn similarity_aggregates(p: &[f64], matrix: &DistanceMatrix, similarity: impl Fn(f64) -> f64) -> Vec<f64> {
    let n = p.len();
    (0..n)
        .map(|i| (0..n).map(|j| p[j] * similarity(matrix.get_f64(i, j))).sum::<f64>())
        .collect()
}

/// Shared by the iterative Leinster-Cobbold aggregator, which builds
/// the same per-node similarity aggregates one row at a time instead
/// of from a materialised [`DistanceMatrix`].
pub(crate) fn hill_like_transform(aggregates: &[f64], p: &[f64], alpha: f64) -> f64 {
    if (alpha - 1.0).abs() < 1e-9 {
        let ln_sum: f64 = p
            .iter()
            .zip(aggregates)
            .map(|(&pi, &agg)| -pi * agg.ln())
            .sum();
        ln_sum.exp()
    } else {
        let sum: f64 = aggregates.iter().map(|&a| a.powf(alpha - 1.0)).sum();
        sum.powf(1.0 / (1.0 - alpha))
    }
}

/// Leinster-Cobbold diversity with similarity kernel `exp(-u * d)`,
/// `u = 1`.
pub fn leinster_cobbold(p: &[f64], matrix: &DistanceMatrix, alpha: f64) -> f64 {
    let aggregates = similarity_aggregates(p, matrix, |d| (-d).exp());
    hill_like_transform(&aggregates, p, alpha)
}

/// Ricotta-Szeidl's Rao-like generalisation of order `alpha`, using
/// the linear similarity kernel `1 - d` (clamped at zero) in place of
/// Leinster-Cobbold's exponential kernel.
pub fn ricotta_szeidl(p: &[f64], matrix: &DistanceMatrix, alpha: f64) -> f64 {
    let aggregates = similarity_aggregates(p, matrix, |d| (1.0 - d).max(0.0));
    hill_like_transform(&aggregates, p, alpha)
}

/// Rao's quadratic entropy: `sum_{i != j} d_ij * p_i * p_j`.
pub fn rao_quadratic_entropy(p: &[f64], matrix: &DistanceMatrix) -> f64 {
    let n = p.len();
    let mut q = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                q += matrix.get_f64(i, j) * p[i] * p[j];
            }
        }
    }
    q
}

/// Chao, Chiu & Villeger-style functional diversity of order `alpha`:
/// Rao's quadratic entropy `Q`, plus its Hill-number transform built
/// from pairwise distances normalised by `Q`.
pub fn chao_functional_diversity(p: &[f64], matrix: &DistanceMatrix, alpha: f64) -> (f64, f64) {
    let q = rao_quadratic_entropy(p, matrix);
    if q <= 0.0 {
        return (0.0, 1.0);
    }
    let n = p.len();

    let hill = if (alpha - 1.0).abs() < 1e-9 {
        let mut ln_sum = 0.0;
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let w = matrix.get_f64(i, j) / q * p[i] * p[j];
                if w > 0.0 {
                    ln_sum -= w * w.ln();
                }
            }
        }
        ln_sum.exp()
    } else {
        let mut sum = 0.0;
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let w = matrix.get_f64(i, j) / q;
                sum += w * (p[i] * p[j]).powf(alpha);
            }
        }
        sum.powf(1.0 / (1.0 - alpha))
    };

    (q, hill)
}

/// Scheiner's species-phylogenetic-functional diversity: the spec
/// describes it as sharing Chao's computational shape, differing only
/// in which parameterisation a caller feeds it.
pub fn scheiner_functional_diversity(p: &[f64], matrix: &DistanceMatrix, alpha: f64) -> (f64, f64) {
    chao_functional_diversity(p, matrix, alpha)
}

/// Functional evenness (Villeger et al. 2008) over an MST: for each
/// edge `k` with endpoint proportions `w_a, w_b`, `EW_k = d_k / (w_a +
/// w_b)`, `PEW_k = EW_k / sum EW`, and `FEve` is the deviation of
/// `PEW` from the perfectly-even partition `1/(n-1)`.
pub fn functional_evenness(mst: &MinimumSpanningTree, p: &[f64]) -> f64 {
    let n = p.len();
    if n <= 2 {
        return 1.0;
    }

    let ew: Vec<f64> = mst
        .edges
        .iter()
        .map(|e| {
            let w_a = p[e.node_a as usize];
            let w_b = p[e.node_b as usize];
            e.distance / (w_a + w_b)
        })
        .collect();
    let sum_ew: f64 = ew.iter().sum();
    if sum_ew == 0.0 {
        return 1.0;
    }

    let threshold = 1.0 / (n as f64 - 1.0);
    let sum_min: f64 = ew.iter().map(|&x| (x / sum_ew).min(threshold)).sum();
    (sum_min - threshold) / (1.0 - threshold)
}

fn weighted_centroid(vectors: &[&[f32]], p: &[f64]) -> Vec<f64> {
    let dim = vectors[0].len();
    let mut centroid = vec![0.0_f64; dim];
    for (vi, &pi) in vectors.iter().zip(p) {
        for d in 0..dim {
            centroid[d] += pi * vi[d] as f64;
        }
    }
    centroid
}

fn euclidean_distance(a: &[f32], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &c)| (x as f64 - c).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Functional dispersion (Laliberte & Legendre 2010): the
/// proportion-weighted mean distance of every node to the
/// proportion-weighted centroid.
pub fn functional_dispersion(vectors: &[&[f32]], p: &[f64]) -> f64 {
    let centroid = weighted_centroid(vectors, p);
    let weight_sum: f64 = p.iter().sum();
    if weight_sum == 0.0 {
        return 0.0;
    }
    let sum: f64 = vectors
        .iter()
        .zip(p)
        .map(|(vi, &pi)| pi * euclidean_distance(vi, &centroid))
        .sum();
    sum / weight_sum
}

/// Functional divergence (Villeger 2008, modified): `(delta_d + d_bar)
/// / (delta_abs_d + d_bar)`, where `d_bar` is the proportion-weighted
/// mean centroid distance and `delta_d`/`delta_abs_d` are the
/// proportion-weighted deviance and absolute deviance of each node's
/// centroid distance from `d_bar`.
pub fn functional_divergence(vectors: &[&[f32]], p: &[f64]) -> f64 {
    let centroid = weighted_centroid(vectors, p);
    let distances: Vec<f64> = vectors.iter().map(|vi| euclidean_distance(vi, &centroid)).collect();
    let d_bar: f64 = p.iter().zip(&distances).map(|(&pi, &di)| pi * di).sum();
    let delta_d: f64 = p.iter().zip(&distances).map(|(&pi, &di)| pi * (di - d_bar)).sum();
    let delta_abs_d: f64 = p
        .iter()
        .zip(&distances)
        .map(|(&pi, &di)| pi * (di - d_bar).abs())
        .sum();

    let denom = delta_abs_d + d_bar;
    if denom == 0.0 {
        return 1.0;
    }
    (delta_d + d_bar) / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingIndex;
    use crate::graph::TypeGraph;
    use crate::matrix::DistanceRowEngine;
    use crate::FpMode;
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
        graph.compute_relative_proportions();
        (dir, embeddings, graph)
    }

    #[test]
    fn pairwise_equals_stirling_identity() {
        let (_dir, embeddings, graph) = fixture(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.3, 0.7]),
            ("c", vec![0.0, 1.0]),
            ("d", vec![0.6, 0.4]),
        ]);
        let engine = DistanceRowEngine::new(&graph, &embeddings);
        let matrix = engine.compute_full_matrix(FpMode::Fp64, 2).unwrap();
        let p = graph.relative_proportions();
        let n = p.len() as f64;

        let pairwise = pairwise_mean_distance(&matrix);
        let stirling_11 = stirling(&p, &matrix, 1.0, 1.0);
        assert!((pairwise - 2.0 * stirling_11 / (n * (n - 1.0))).abs() < 1e-9);
    }

    #[test]
    fn functional_dispersion_on_one_node_graph_is_zero() {
        let vectors: Vec<&[f32]> = vec![&[1.0, 2.0, 3.0]];
        let p = [1.0];
        assert!(functional_dispersion(&vectors, &p).abs() < 1e-12);
    }

    #[test]
    fn functional_evenness_is_one_for_a_perfectly_even_mst() {
        use crate::heap::DistanceHeap;
        use crate::mst::MinimumSpanningTree;

        // Four nodes with equal proportions and an MST where every
        // edge weight function value is identical: PEW_k = 1/(n-1)
        // for all k, driving FEve to its maximum of 1.
        let p = [0.25_f64; 4];
        let dists = [(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (0, 2, 5.0), (0, 3, 5.0), (1, 3, 5.0)];
        let mut heap = DistanceHeap::build(4, |i, j| {
            dists
                .iter()
                .find(|&&(a, b, _)| (a.min(b), a.max(b)) == (i.min(j), i.max(j)))
                .map(|&(_, _, d)| d)
                .unwrap()
        });
        let mst = MinimumSpanningTree::build(4, &mut heap);
        let feve = functional_evenness(&mst, &p);
        assert!((feve - 1.0).abs() < 1e-6);
    }
}
