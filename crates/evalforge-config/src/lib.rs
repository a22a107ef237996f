//! Hierarchical configuration for the evalforge pipeline: CLI args > config
//! file (`evalforge.toml`) > built-in defaults.
//!
//! The LLM provider API key and optional experiment-tracker keys are read
//! from the process environment exactly once, here, during
//! [`Config::discover`]. Nothing downstream of this crate touches
//! `std::env` directly.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::{
    BackendConfig, Config, ExperimentTrackerConfig, LlmConfig, PipelineDefaults, ProviderKind,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_pipeline_minimums() {
        let config = Config::builder()
            .input_path("doc.md")
            .out_path("out")
            .build()
            .expect("default config should build");
        assert!(config.pipeline.min_use_cases >= 1);
        assert!(config.pipeline.min_test_cases_per_uc >= 1);
        assert!(config.pipeline.min_examples_per_tc >= 1);
    }
}
