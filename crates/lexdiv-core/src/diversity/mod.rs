//! Diversity indices: frequency-only ([`non_disparity`]) and
//! embedding-distance-weighted ([`disparity`]) measures, plus the
//! single-pass [`iterative`] aggregators for the three disparity
//! indices that support a streaming variant.

pub mod disparity;
pub mod iterative;
pub mod non_disparity;

pub use disparity::{
    chao_functional_diversity, functional_dispersion, functional_divergence, functional_evenness,
    leinster_cobbold, pairwise_mean_distance, rao_quadratic_entropy, ricotta_szeidl,
    scheiner_functional_diversity, stirling,
};
pub use iterative::{LeinsterCobboldAggregator, PairwiseAggregator, StirlingAggregator};
pub use non_disparity::{
    alatalo_f21, berger_parker, brillouin, bulla_e, bulla_o, camargo_1993, good_entropy,
    heip_evenness, hill_evenness, hill_number, junge1994_p22, mcintosh_evenness_pielou1969,
    mcintosh_index, molinari_g21, patil_taillie, pielou_1975, pielou_1977,
    q_logarithmic_entropy, renyi_entropy, shannon_hill, shannon_wiener, simpson,
    simpson_dominance, smith_wilson_evar, williams_1964,
};
