//! Evaluates the subset of spec.md §4.J's diversity battery the caller
//! enabled via [`crate::config::IndexSelection`], in a stable
//! declaration order matching the CLI flags.

use crate::config::IndexSelection;
use lexdiv_core::diversity as dv;
use lexdiv_core::matrix::DistanceMatrix;
use lexdiv_core::mst::MinimumSpanningTree;

/// Results of the three indices that support an iterative, row-at-a-
/// time computation, when `--enable_iterative_distance_computation` is
/// set and the full matrix was skipped.
#[derive(Default)]
pub struct IterativeResults {
    pub pairwise: Option<f64>,
    pub stirling: Option<f64>,
    pub leinster_cobbold: Option<f64>,
}

pub fn non_disparity_values(idx: &IndexSelection, p: &[f64], absolute: &[u64]) -> Vec<(String, f64)> {
    let mut out = Vec::new();
    let entropy = dv::shannon_wiener(p);

    if idx.enable_shannon_wiener {
        out.push(("shannon_wiener".to_string(), entropy));
    }
    if idx.enable_shannon_hill {
        out.push(("shannon_hill".to_string(), dv::shannon_hill(entropy)));
    }
    if idx.enable_simpson {
        out.push(("simpson".to_string(), dv::simpson(p)));
    }
    if idx.enable_simpson_dominance {
        out.push(("simpson_dominance".to_string(), dv::simpson_dominance(p)));
    }
    if idx.enable_berger_parker {
        out.push(("berger_parker".to_string(), dv::berger_parker(p)));
    }
    if idx.enable_hill {
        out.push(("hill".to_string(), dv::hill_number(p, idx.hill_alpha)));
    }
    if idx.enable_renyi {
        out.push(("renyi".to_string(), dv::renyi_entropy(p, idx.renyi_alpha)));
    }
    if idx.enable_patil_taillie {
        out.push(("patil_taillie".to_string(), dv::patil_taillie(p, idx.patil_taillie_alpha)));
    }
    if idx.enable_q_logarithmic {
        out.push(("q_logarithmic".to_string(), dv::q_logarithmic_entropy(p, idx.q_logarithmic_q)));
    }
    if idx.enable_good {
        out.push(("good".to_string(), dv::good_entropy(p, idx.good_alpha, idx.good_beta)));
    }
    if idx.enable_brillouin {
        out.push(("brillouin".to_string(), dv::brillouin(absolute)));
    }
    if idx.enable_mcintosh {
        out.push(("mcintosh".to_string(), dv::mcintosh_index(absolute)));
    }
    if idx.enable_mcintosh_evenness_pielou1969 {
        out.push((
            "mcintosh_evenness_pielou1969".to_string(),
            dv::mcintosh_evenness_pielou1969(absolute),
        ));
    }
    if idx.enable_heip {
        out.push(("heip".to_string(), dv::heip_evenness(entropy, p.len())));
    }
    if idx.enable_alatalo_f21 {
        out.push(("alatalo_f21".to_string(), dv::alatalo_f21(entropy, p)));
    }
    if idx.enable_molinari_g21 {
        out.push(("molinari_g21".to_string(), dv::molinari_g21(p)));
    }
    if idx.enable_bulla_o {
        out.push(("bulla_o".to_string(), dv::bulla_o(p)));
    }
    if idx.enable_bulla_e {
        out.push(("bulla_e".to_string(), dv::bulla_e(p)));
    }
    if idx.enable_pielou_1975 {
        out.push(("pielou_1975".to_string(), dv::pielou_1975(entropy, p.len())));
    }
    if idx.enable_williams_1964 {
        out.push(("williams_1964".to_string(), dv::williams_1964(entropy, p.len())));
    }
    if idx.enable_camargo_1993 {
        out.push(("camargo_1993".to_string(), dv::camargo_1993(p)));
    }
    if idx.enable_smith_wilson_evar {
        out.push(("smith_wilson_evar".to_string(), dv::smith_wilson_evar(absolute)));
    }
    if idx.enable_junge1994_p22 {
        out.push(("junge1994_p22".to_string(), dv::junge1994_p22(entropy, absolute)));
    }
    if idx.enable_hill_evenness {
        out.push((
            "hill_evenness".to_string(),
            dv::hill_evenness(p, idx.hill_evenness_alpha, idx.hill_evenness_beta),
        ));
    }
    out
}

/// `pielou_1977` is kept out of [`non_disparity_values`] because its
/// divisor is the embedding dimensionality, not a quantity derivable
/// from `p`/`absolute` alone -- the driver supplies it separately.
pub fn pielou_1977_value(idx: &IndexSelection, p: &[f64], num_dimensions: u16) -> Option<(String, f64)> {
    if !idx.enable_pielou_1977 {
        return None;
    }
    let entropy = dv::shannon_wiener(p);
    Some(("pielou_1977".to_string(), dv::pielou_1977(entropy, num_dimensions)))
}

pub fn needs_full_matrix(idx: &IndexSelection, iterative: bool) -> bool {
    let matrix_only = idx.enable_rao
        || idx.enable_ricotta_szeidl
        || idx.enable_chao
        || idx.enable_scheiner
        || idx.enable_functional_evenness;
    let iterative_capable = idx.enable_pairwise || idx.enable_stirling || idx.enable_leinster_cobbold;
    matrix_only || (iterative_capable && !iterative)
}

pub fn needs_raw_vectors(idx: &IndexSelection) -> bool {
    idx.enable_functional_dispersion || idx.enable_functional_divergence
}

/// Indices computed from a materialised [`DistanceMatrix`]: pairwise,
/// Stirling and Leinster-Cobbold only appear here when they were not
/// already satisfied by [`IterativeResults`].
pub fn disparity_values(
    idx: &IndexSelection,
    p: &[f64],
    matrix: Option<&DistanceMatrix>,
    mst: Option<&MinimumSpanningTree>,
    iterative: &IterativeResults,
) -> crate::error::Result<Vec<(String, f64)>> {
    fn required<'a>(matrix: Option<&'a DistanceMatrix>, who: &str) -> crate::error::Result<&'a DistanceMatrix> {
        matrix.ok_or_else(|| {
            crate::error::CliError::Core(lexdiv_core::Error::LogicInvariant(format!(
                "{who} was enabled but no distance matrix was built for this checkpoint"
            )))
        })
    }

    let mut out = Vec::new();

    if idx.enable_pairwise {
        let v = match iterative.pairwise {
            Some(v) => v,
            None => dv::pairwise_mean_distance(required(matrix, "pairwise")?),
        };
        out.push(("pairwise".to_string(), v));
    }
    if idx.enable_stirling {
        let v = match iterative.stirling {
            Some(v) => v,
            None => dv::stirling(p, required(matrix, "stirling")?, idx.stirling_alpha, idx.stirling_beta),
        };
        out.push(("stirling".to_string(), v));
    }
    if idx.enable_leinster_cobbold {
        let v = match iterative.leinster_cobbold {
            Some(v) => v,
            None => dv::leinster_cobbold(p, required(matrix, "leinster_cobbold")?, idx.leinster_cobbold_alpha),
        };
        out.push(("leinster_cobbold".to_string(), v));
    }
    if idx.enable_rao {
        out.push(("rao".to_string(), dv::rao_quadratic_entropy(p, required(matrix, "rao")?)));
    }
    if idx.enable_ricotta_szeidl {
        out.push((
            "ricotta_szeidl".to_string(),
            dv::ricotta_szeidl(p, required(matrix, "ricotta_szeidl")?, idx.ricotta_szeidl_alpha),
        ));
    }
    if idx.enable_chao {
        let (q, hill) = dv::chao_functional_diversity(p, required(matrix, "chao")?, idx.chao_alpha);
        out.push(("chao_q".to_string(), q));
        out.push(("chao_hill".to_string(), hill));
    }
    if idx.enable_scheiner {
        let (q, hill) = dv::scheiner_functional_diversity(p, required(matrix, "scheiner")?, idx.scheiner_alpha);
        out.push(("scheiner_q".to_string(), q));
        out.push(("scheiner_hill".to_string(), hill));
    }
    if idx.enable_functional_evenness {
        let mst = mst.ok_or_else(|| {
            crate::error::CliError::Core(lexdiv_core::Error::LogicInvariant(
                "functional_evenness was enabled but no MST was built for this checkpoint".to_string(),
            ))
        })?;
        out.push(("functional_evenness".to_string(), dv::functional_evenness(mst, p)));
    }
    Ok(out)
}

pub fn raw_vector_values(idx: &IndexSelection, vectors: &[&[f32]], p: &[f64]) -> Vec<(String, f64)> {
    let mut out = Vec::new();
    if idx.enable_functional_dispersion {
        out.push(("functional_dispersion".to_string(), dv::functional_dispersion(vectors, p)));
    }
    if idx.enable_functional_divergence {
        out.push(("functional_divergence".to_string(), dv::functional_divergence(vectors, p)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_enabled_non_disparity_indices_are_reported() {
        let mut idx = IndexSelection::default();
        idx.enable_shannon_wiener = true;
        idx.enable_simpson = true;

        let p = [0.5_f64, 0.3, 0.2];
        let values = non_disparity_values(&idx, &p, &[5, 3, 2]);
        let names: Vec<&str> = values.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["shannon_wiener", "simpson"]);
    }

    #[test]
    fn disparity_values_error_when_a_matrix_dependent_index_has_no_matrix() {
        let mut idx = IndexSelection::default();
        idx.enable_rao = true;
        let p = [0.5_f64, 0.5];
        let result = disparity_values(&idx, &p, None, None, &IterativeResults::default());
        assert!(result.is_err());
    }

    #[test]
    fn pielou_1977_value_is_none_when_disabled() {
        let idx = IndexSelection::default();
        assert!(pielou_1977_value(&idx, &[0.5, 0.5], 100).is_none());
    }
}
