//! CLI flag surface, parsed with `clap`'s derive API the way the
//! teacher's `graph_app`/`graph_server` binaries do. Every `--enable_*`
//! flag follows spec.md's boolean convention: a value of `"1"` turns the
//! feature on, anything else leaves it off.

use clap::{Parser, ValueEnum};

fn truthy(s: &str) -> bool {
    s == "1"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetColumn {
    #[clap(name = "UD_FORM")]
    UdForm,
    #[clap(name = "UD_LEMMA")]
    UdLemma,
    #[clap(name = "UD_MWE")]
    UdMwe,
}

impl Default for TargetColumn {
    fn default() -> Self {
        Self::UdForm
    }
}

/// Which indices to evaluate at each checkpoint, and the alpha/beta
/// parameters the parameterised ones need. Mirrors spec.md §4.J's index
/// battery one bool per index, `--enable_<index>=1` to turn it on.
#[derive(Debug, Parser)]
#[clap(
    name = "lexdiv-measure",
    version,
    about = "Streaming lexical-diversity measurement engine",
    arg_required_else_help = true,
    disable_help_subcommand = true,
    infer_long_args = true
)]
pub struct CliOpts {
    #[clap(long)]
    pub w2v_path: String,

    #[clap(long)]
    pub input_path: String,

    #[clap(long)]
    pub output_path: String,

    #[clap(long, value_enum, default_value_t = TargetColumn::UdForm)]
    pub target_column: TargetColumn,

    #[clap(long, default_value_t = 1)]
    pub num_row_threads: usize,

    #[clap(long, default_value_t = 1)]
    pub num_matrix_threads: usize,

    #[clap(long, default_value_t = 1)]
    pub num_file_reading_threads: usize,

    #[clap(long, default_value_t = 0)]
    pub sentence_count_recompute_step: u64,

    #[clap(long, default_value = "0", value_parser = truthy)]
    pub sentence_count_recompute_step_log10: bool,

    #[clap(long, default_value_t = 0)]
    pub document_count_recompute_step: u64,

    #[clap(long, default_value = "0", value_parser = truthy)]
    pub document_count_recompute_step_log10: bool,

    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_iterative_distance_computation: bool,

    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_timing_output: bool,

    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_memory_output: bool,

    #[clap(flatten)]
    pub indices: IndexSelection,
}

#[derive(Debug, Default, Parser)]
pub struct IndexSelection {
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_shannon_wiener: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_shannon_hill: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_simpson: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_simpson_dominance: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_berger_parker: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_hill: bool,
    #[clap(long, default_value_t = 1.0)]
    pub hill_alpha: f64,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_renyi: bool,
    #[clap(long, default_value_t = 1.0)]
    pub renyi_alpha: f64,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_patil_taillie: bool,
    #[clap(long, default_value_t = 1.0)]
    pub patil_taillie_alpha: f64,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_q_logarithmic: bool,
    #[clap(long, default_value_t = 2.0)]
    pub q_logarithmic_q: f64,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_good: bool,
    #[clap(long, default_value_t = 1.0)]
    pub good_alpha: f64,
    #[clap(long, default_value_t = 1.0)]
    pub good_beta: f64,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_brillouin: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_mcintosh: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_mcintosh_evenness_pielou1969: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_heip: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_alatalo_f21: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_molinari_g21: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_bulla_o: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_bulla_e: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_pielou_1975: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_pielou_1977: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_williams_1964: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_camargo_1993: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_smith_wilson_evar: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_junge1994_p22: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_hill_evenness: bool,
    #[clap(long, default_value_t = 2.0)]
    pub hill_evenness_alpha: f64,
    #[clap(long, default_value_t = 1.0)]
    pub hill_evenness_beta: f64,

    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_pairwise: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_stirling: bool,
    #[clap(long, default_value_t = 1.0)]
    pub stirling_alpha: f64,
    #[clap(long, default_value_t = 1.0)]
    pub stirling_beta: f64,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_rao: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_ricotta_szeidl: bool,
    #[clap(long, default_value_t = 1.0)]
    pub ricotta_szeidl_alpha: f64,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_chao: bool,
    #[clap(long, default_value_t = 1.0)]
    pub chao_alpha: f64,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_scheiner: bool,
    #[clap(long, default_value_t = 1.0)]
    pub scheiner_alpha: f64,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_leinster_cobbold: bool,
    #[clap(long, default_value_t = 1.0)]
    pub leinster_cobbold_alpha: f64,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_functional_evenness: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_functional_dispersion: bool,
    #[clap(long, default_value = "0", value_parser = truthy)]
    pub enable_functional_divergence: bool,
}

impl CliOpts {
    pub fn new() -> Self {
        Self::parse()
    }
}
