use std::path::PathBuf;

/// CLI-supplied overrides, highest-precedence layer in [`crate::Config::discover`].
///
/// Deliberately plain data with no `clap` dependency: the thin CLI crate
/// parses its own arguments and converts them into this shape, so this
/// crate stays usable by any embedder (library caller, test harness) that
/// never touches `clap` at all.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub input_path: Option<PathBuf>,
    pub out_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub min_use_cases: Option<usize>,
    pub min_test_cases_per_uc: Option<usize>,
    pub min_examples_per_tc: Option<usize>,
}
