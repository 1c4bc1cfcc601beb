//! Zipfian shape-parameter fitter: a bracketed grid search minimising
//! mean squared error against the normalised theoretical Zipfian
//! distribution.

const BRACKET_LOW: f64 = 0.0;
const BRACKET_HIGH: f64 = 10.0;
const REFINEMENT_LEVELS: usize = 8;
const CANDIDATES_PER_LEVEL: usize = 32;

/// Fits a Zipfian exponent `s` to `relative_proportions`. Sorts a copy
/// descending, then narrows the bracket `[0, 10]` over
/// [`REFINEMENT_LEVELS`] rounds, evaluating [`CANDIDATES_PER_LEVEL`]
/// equally spaced candidates per round and keeping the one with lowest
/// MSE. Each round's next bracket is `best_s +/- (window / 10) / 2`,
/// clamped to stay non-negative. No convergence guarantee, but each
/// round's best MSE is no worse than the previous round's.
pub fn zipfian_fit(relative_proportions: &[f64]) -> f64 {
    if relative_proportions.is_empty() {
        return 0.0;
    }

    let mut sorted = relative_proportions.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
    let n = sorted.len();

    let mut lower = BRACKET_LOW;
    let mut upper = BRACKET_HIGH;
    let mut best_s = lower;

    for _ in 0..REFINEMENT_LEVELS {
        let window = upper - lower;
        let step = window / (CANDIDATES_PER_LEVEL - 1) as f64;
        let mut best_mse = f64::INFINITY;

        for c in 0..CANDIDATES_PER_LEVEL {
            let s = lower + step * c as f64;
            let mse = zipfian_mse(&sorted, s, n);
            if mse < best_mse {
                best_mse = mse;
                best_s = s;
            }
        }

        let half_window = (window / 10.0) / 2.0;
        lower = (best_s - half_window).max(0.0);
        upper = best_s + half_window;
    }

    best_s
}

/// Mean squared error between `sorted` (relative proportions, rank 1
/// first) and the normalised Zipfian `i^-s / sum_j j^-s`.
pub fn zipfian_mse(sorted_desc: &[f64], s: f64, n: usize) -> f64 {
    let normaliser: f64 = (1..=n).map(|j| (j as f64).powf(-s)).sum();
    let mut sse = 0.0;
    for (idx, &p_i) in sorted_desc.iter().enumerate() {
        let rank = (idx + 1) as f64;
        let theoretical = rank.powf(-s) / normaliser;
        let diff = p_i - theoretical;
        sse += diff * diff;
    }
    sse / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zipfian_distribution(n: usize, s: f64) -> Vec<f64> {
        let normaliser: f64 = (1..=n).map(|j| (j as f64).powf(-s)).sum();
        (1..=n).map(|i| (i as f64).powf(-s) / normaliser).collect()
    }

    #[test]
    fn recovers_known_exponent() {
        let p = zipfian_distribution(50, 1.2);
        let fitted = zipfian_fit(&p);
        assert!((fitted - 1.2).abs() < 0.05, "fitted s = {fitted}");
    }

    #[test]
    fn fitted_s_locally_minimises_mse() {
        let p = zipfian_distribution(50, 0.8);
        let fitted = zipfian_fit(&p);
        let n = p.len();
        let mut sorted = p.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());

        let at_best = zipfian_mse(&sorted, fitted, n);
        let a_bit_lower = zipfian_mse(&sorted, (fitted - 0.01).max(0.0), n);
        let a_bit_higher = zipfian_mse(&sorted, fitted + 0.01, n);
        assert!(at_best <= a_bit_lower + 1e-9);
        assert!(at_best <= a_bit_higher + 1e-9);
    }

    #[test]
    fn empty_input_returns_zero() {
        assert_eq!(zipfian_fit(&[]), 0.0);
    }
}
