//! Frequency-only ("non-disparity") diversity indices: every function
//! here takes only the type graph's relative proportions `p_i` (plus,
//! for a handful of classic abundance-based indices, the matching
//! absolute counts `n_i`). None of these consult the distance matrix.

/// Shannon-Wiener entropy `H = -sum p_i ln p_i`.
pub fn shannon_wiener(p: &[f64]) -> f64 {
    -p.iter().filter(|&&x| x > 0.0).map(|&x| x * x.ln()).sum::<f64>()
}

/// Hill number of order 1, the exponential of Shannon entropy.
pub fn shannon_hill(entropy: f64) -> f64 {
    entropy.exp()
}

pub fn simpson(p: &[f64]) -> f64 {
    p.iter().map(|&x| x * x).sum()
}

pub fn simpson_dominance(p: &[f64]) -> f64 {
    1.0 - simpson(p)
}

pub fn berger_parker(p: &[f64]) -> f64 {
    p.iter().cloned().fold(0.0_f64, f64::max)
}

/// Hill number of order `alpha`. The limit at `alpha == 1` is taken as
/// `exp(shannon_wiener(p))` since the closed form is `0/0` there.
pub fn hill_number(p: &[f64], alpha: f64) -> f64 {
    if (alpha - 1.0).abs() < 1e-9 {
        return shannon_hill(shannon_wiener(p));
    }
    let sum: f64 = p.iter().map(|&x| x.powf(alpha)).sum();
    sum.powf(1.0 / (1.0 - alpha))
}

/// Ratio of two Hill numbers of different order (Tuomisto 2012's
/// evenness ratio `E(beta, alpha) = D_beta / D_alpha`), a published
/// generalisation of evenness across the whole Hill-number family
/// rather than a single fixed pair of orders.
pub fn hill_evenness(p: &[f64], alpha: f64, beta: f64) -> f64 {
    hill_number(p, beta) / hill_number(p, alpha)
}

/// Renyi entropy of order `alpha`. The limit at `alpha == 1` is the
/// Shannon entropy.
pub fn renyi_entropy(p: &[f64], alpha: f64) -> f64 {
    if (alpha - 1.0).abs() < 1e-9 {
        return shannon_wiener(p);
    }
    let sum: f64 = p.iter().map(|&x| x.powf(alpha)).sum();
    sum.ln() / (1.0 - alpha)
}

pub fn patil_taillie(p: &[f64], alpha: f64) -> f64 {
    let sum: f64 = p.iter().map(|&x| x.powf(alpha + 1.0)).sum();
    (1.0 - sum) / alpha
}

pub fn q_logarithmic_entropy(p: &[f64], q: f64) -> f64 {
    let sum: f64 = p.iter().map(|&x| x.powf(q)).sum();
    (1.0 - sum) / (q - 1.0)
}

/// Good's (alpha, beta)-family index: `-sum p_i^alpha * (ln p_i)^beta`.
pub fn good_entropy(p: &[f64], alpha: f64, beta: f64) -> f64 {
    -p.iter()
        .filter(|&&x| x > 0.0)
        .map(|&x| x.powf(alpha) * x.ln().powf(beta))
        .sum::<f64>()
}

/// ln(n!) by direct summation. The core's populations are bounded by
/// realistic corpus sizes, so this is adequate without a lgamma
/// dependency.
fn ln_factorial(n: u64) -> f64 {
    (1..=n).map(|k| (k as f64).ln()).sum()
}

/// Brillouin's index over absolute counts: `(ln N! - sum ln n_i!) / N`.
pub fn brillouin(absolute: &[u64]) -> f64 {
    let total: u64 = absolute.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let sum_ln_fact: f64 = absolute.iter().map(|&n| ln_factorial(n)).sum();
    (ln_factorial(total) - sum_ln_fact) / total as f64
}

/// McIntosh's diversity index: `(N - sqrt(sum n_i^2)) / (N - sqrt(N))`.
pub fn mcintosh_index(absolute: &[u64]) -> f64 {
    let total: u64 = absolute.iter().sum();
    let n = total as f64;
    let sum_sq: f64 = absolute.iter().map(|&x| (x as f64).powi(2)).sum();
    let denom = n - n.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (n - sum_sq.sqrt()) / denom
}

/// McIntosh's evenness (Pielou 1969's normalisation of the McIntosh
/// diversity index against its maximum for `s` equally abundant
/// species): `(N - sqrt(sum n_i^2)) / (N - N/sqrt(s))`.
pub fn mcintosh_evenness_pielou1969(absolute: &[u64]) -> f64 {
    let s = absolute.len() as f64;
    if s <= 1.0 {
        return 1.0;
    }
    let total: u64 = absolute.iter().sum();
    let n = total as f64;
    let sum_sq: f64 = absolute.iter().map(|&x| (x as f64).powi(2)).sum();
    let denom = n - n / s.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (n - sum_sq.sqrt()) / denom
}

/// Heip's evenness: `(exp(H) - 1) / (S - 1)`.
pub fn heip_evenness(entropy: f64, num_species: usize) -> f64 {
    let s = num_species as f64;
    if s <= 1.0 {
        return 1.0;
    }
    (entropy.exp() - 1.0) / (s - 1.0)
}

/// Pielou's (1975) evenness: `H / ln(S)`.
pub fn pielou_1975(entropy: f64, num_species: usize) -> f64 {
    let s = num_species as f64;
    if s <= 1.0 {
        return 1.0;
    }
    entropy / s.ln()
}

/// Pielou's (1977) variant, which the original source divides by
/// `ln(D)` -- the embedding dimensionality -- rather than `ln(n)`, the
/// node count. Preserved verbatim; see the project design notes.
pub fn pielou_1977(entropy: f64, num_dimensions: u16) -> f64 {
    let d = num_dimensions as f64;
    if d <= 1.0 {
        return 1.0;
    }
    entropy / d.ln()
}

/// Alatalo's (1981) F_{2,1} evenness: `(1/D - 1) / (exp(H) - 1)` with
/// `D = sum p_i^2` (Simpson's index).
pub fn alatalo_f21(entropy: f64, p: &[f64]) -> f64 {
    let d = simpson(p);
    let denom = entropy.exp() - 1.0;
    if denom == 0.0 {
        return 1.0;
    }
    (1.0 / d - 1.0) / denom
}

/// Molinari's (1989) G_{2,1} evenness, a bounded transform of
/// Simpson's index against species richness: `S*(1 - D) / (S - 1)`.
pub fn molinari_g21(p: &[f64]) -> f64 {
    let s = p.len() as f64;
    if s <= 1.0 {
        return 1.0;
    }
    let d = simpson(p);
    s * (1.0 - d) / (s - 1.0)
}

/// Bulla's (1994) overlap `O = sum_i min(p_i, 1/S)`.
pub fn bulla_o(p: &[f64]) -> f64 {
    let s = p.len() as f64;
    p.iter().map(|&x| x.min(1.0 / s)).sum()
}

/// Bulla's (1994) evenness `E = (O - 1/S) / (1 - 1/S)`.
pub fn bulla_e(p: &[f64]) -> f64 {
    let s = p.len() as f64;
    if s <= 1.0 {
        return 1.0;
    }
    let o = bulla_o(p);
    let inv_s = 1.0 / s;
    (o - inv_s) / (1.0 - inv_s)
}

/// Williams' (1964) evenness, the ratio of the Shannon-Hill number to
/// species richness: `exp(H) / S`.
pub fn williams_1964(entropy: f64, num_species: usize) -> f64 {
    let s = num_species as f64;
    if s == 0.0 {
        return 0.0;
    }
    entropy.exp() / s
}

/// Camargo's (1993) evenness: `E' = 1 - sum_{i<j} |p_i - p_j| / S`.
pub fn camargo_1993(p: &[f64]) -> f64 {
    let s = p.len() as f64;
    if s == 0.0 {
        return 1.0;
    }
    let mut sum = 0.0;
    for i in 0..p.len() {
        for j in (i + 1)..p.len() {
            sum += (p[i] - p[j]).abs();
        }
    }
    1.0 - sum / s
}

/// Smith & Wilson's (1996) `E_var`, computed from log-abundances:
/// `1 - (2/pi) * arctan(sum (ln n_i - mean ln n)^2 / S)`.
pub fn smith_wilson_evar(absolute: &[u64]) -> f64 {
    let s = absolute.len();
    if s == 0 {
        return 1.0;
    }
    let ln_abund: Vec<f64> = absolute.iter().map(|&n| (n.max(1) as f64).ln()).collect();
    let mean = ln_abund.iter().sum::<f64>() / s as f64;
    let variance_like: f64 = ln_abund.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / s as f64;
    1.0 - (2.0 / std::f64::consts::PI) * variance_like.atan()
}

/// Junge's (1994, p.22) entropy-based evenness, normalising Shannon
/// entropy by the log of the total observation count rather than
/// species richness.
pub fn junge1994_p22(entropy: f64, absolute: &[u64]) -> f64 {
    let total: u64 = absolute.iter().sum();
    if total <= 1 {
        return 1.0;
    }
    entropy / (total as f64).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_type_shannon_scenario() {
        let p = [0.75_f64, 0.25];
        let h = shannon_wiener(&p);
        assert!((h - 0.5623).abs() < 1e-4);
        assert!((shannon_hill(h) - 1.7549).abs() < 1e-4);
    }

    #[test]
    fn simpson_and_dominance_sum_to_one() {
        let p = [0.2_f64, 0.3, 0.5];
        assert!((simpson(&p) + simpson_dominance(&p) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hill_order_one_matches_shannon_hill() {
        let p = [0.4_f64, 0.35, 0.25];
        let h = shannon_wiener(&p);
        assert!((hill_number(&p, 1.0) - shannon_hill(h)).abs() < 1e-9);
    }

    #[test]
    fn renyi_order_one_matches_shannon() {
        let p = [0.4_f64, 0.35, 0.25];
        assert!((renyi_entropy(&p, 1.0) - shannon_wiener(&p)).abs() < 1e-9);
    }

    #[test]
    fn hill_evenness_is_one_for_a_uniform_distribution() {
        let p = [0.25_f64; 4];
        assert!((hill_evenness(&p, 2.0, 1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hill_evenness_matches_ratio_of_hill_numbers() {
        let p = [0.6_f64, 0.3, 0.1];
        let expected = hill_number(&p, 1.0) / hill_number(&p, 2.0);
        assert!((hill_evenness(&p, 2.0, 1.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn camargo_matches_spec_formula_directly() {
        let p = [0.5_f64, 0.3, 0.2];
        let mut sum = 0.0;
        for i in 0..p.len() {
            for j in (i + 1)..p.len() {
                sum += (p[i] - p[j]).abs();
            }
        }
        let expected = 1.0 - sum / p.len() as f64;
        assert!((camargo_1993(&p) - expected).abs() < 1e-12);
    }

    #[test]
    fn berger_parker_is_the_max_proportion() {
        let p = [0.1_f64, 0.6, 0.3];
        assert_eq!(berger_parker(&p), 0.6);
    }

    #[test]
    fn bulla_evenness_is_one_for_a_uniform_distribution() {
        let p = [0.25_f64; 4];
        assert!((bulla_e(&p) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn brillouin_is_zero_for_a_single_type() {
        assert_eq!(brillouin(&[10]), 0.0);
    }
}
