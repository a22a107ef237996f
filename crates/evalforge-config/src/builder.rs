use std::collections::HashMap;
use std::path::PathBuf;

use evalforge_utils::error::PipelineError;

use crate::model::{
    BackendConfig, Config, DEFAULT_ESCALATION_SENTENCE, LlmConfig, PipelineDefaults, ProviderKind,
    default_model_for,
};

/// Fluent, programmatic alternative to [`Config::discover`] for embedding
/// the pipeline without environment/file discovery (library callers, unit
/// tests).
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    input_path: Option<PathBuf>,
    out_path: Option<PathBuf>,
    seed: Option<u64>,
    provider: ProviderKind_,
    model: Option<String>,
    pipeline: PipelineDefaults,
}

/// Wrapper so `#[derive(Default)]` works without requiring `ProviderKind`
/// itself to implement `Default` (it deliberately does not — every call
/// site should be explicit about which provider it means).
#[derive(Debug, Clone, Copy)]
struct ProviderKind_(ProviderKind);

impl Default for ProviderKind_ {
    fn default() -> Self {
        Self(ProviderKind::Anthropic)
    }
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipeline: PipelineDefaults::default(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn out_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.out_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = ProviderKind_(provider);
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn min_use_cases(mut self, n: usize) -> Self {
        self.pipeline.min_use_cases = n;
        self
    }

    #[must_use]
    pub fn min_test_cases_per_uc(mut self, n: usize) -> Self {
        self.pipeline.min_test_cases_per_uc = n;
        self
    }

    #[must_use]
    pub fn min_examples_per_tc(mut self, n: usize) -> Self {
        self.pipeline.min_examples_per_tc = n;
        self
    }

    /// Build the final [`Config`]. The API key is still read from the
    /// provider's default environment variable, once, here — the builder
    /// does not bypass the "read env once at config construction" rule.
    pub fn build(self) -> Result<Config, PipelineError> {
        let provider = self.provider.0;
        let model = self
            .model
            .unwrap_or_else(|| default_model_for(provider).to_string());
        let api_key_env = BackendConfig::default_api_key_env(provider);
        let api_key = std::env::var(api_key_env).ok().map(Into::into);

        let config = Config {
            input_path: self.input_path.unwrap_or_default(),
            out_path: self.out_path.unwrap_or_default(),
            seed: self.seed,
            llm: LlmConfig {
                primary: BackendConfig {
                    provider,
                    model,
                    api_key,
                    base_url: None,
                    max_tokens: 4096,
                },
                fallback: None,
                temperature: 0.0,
            },
            pipeline: self.pipeline,
            experiment_tracker: None,
            escalation_sentence: DEFAULT_ESCALATION_SENTENCE.to_string(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            source_attribution: HashMap::new(),
        };
        config.validate()?;
        Ok(config)
    }
}
