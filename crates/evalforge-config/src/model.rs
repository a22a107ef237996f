use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use evalforge_utils::types::ConfigSource;
use serde::{Deserialize, Serialize};

/// Canonical escalation sentence used by `dialog_last_turn_correction`
/// examples when `escalation_needed = yes`. The source document
/// defines its own wording; this is never hard-coded into the format
/// adapters, only carried here.
pub const DEFAULT_ESCALATION_SENTENCE: &str =
    "Я передаю ваш запрос специалисту, который свяжется с вами в ближайшее время.";

/// A secret value whose `Debug`/`Display` never reveal the underlying
/// string, so a `Config` can be logged or included in error context safely.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Secret(pub String);

impl Secret {
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which structured-output LLM provider a [`BackendConfig`] targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Anthropic,
    OpenRouter,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenRouter => write!(f, "openrouter"),
        }
    }
}

/// Configuration for one LLM backend (primary or fallback).
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    pub provider: ProviderKind,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_tokens() -> u32 {
    4096
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl BackendConfig {
    /// Environment variable this provider's API key is read from by
    /// convention, absent an explicit override in the TOML file.
    #[must_use]
    pub fn default_api_key_env(provider: ProviderKind) -> &'static str {
        match provider {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

/// Default model identifier for a provider, used when no model override is
/// supplied via CLI, config file, or builder.
#[must_use]
pub fn default_model_for(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Anthropic => "claude-sonnet-4-5",
        ProviderKind::OpenRouter => "anthropic/claude-sonnet-4-5",
    }
}

/// LLM configuration: the primary backend used for every structured call,
/// and an optional fallback backend constructed when the primary cannot be
/// built at all (missing key, unsupported provider) — never substituted for
/// a runtime/rate-limit failure, which the retry policy in `evalforge-llm`
/// handles instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    pub primary: BackendConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<BackendConfig>,
    /// Temperature is fixed at 0 per the structured-call contract;
    /// this field exists only so tests can assert the invariant rather than
    /// hard-coding `0.0` at every call site.
    #[serde(default)]
    pub temperature: f32,
}

/// Minimum-count knobs threaded through `generate(...)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineDefaults {
    pub min_use_cases: usize,
    pub min_test_cases_per_uc: usize,
    pub min_examples_per_tc: usize,
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            min_use_cases: 5,
            min_test_cases_per_uc: 3,
            min_examples_per_tc: 1,
        }
    }
}

/// Optional experiment-tracking service credentials, consumed only by the
/// external `upload` collaborator — the core never dials out to it.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentTrackerConfig {
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<Secret>,
}

impl fmt::Debug for ExperimentTrackerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperimentTrackerConfig")
            .field("host", &self.host)
            .field("public_key", &self.public_key.as_ref().map(|_| "[REDACTED]"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Fully resolved pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub input_path: PathBuf,
    pub out_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub llm: LlmConfig,
    pub pipeline: PipelineDefaults,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_tracker: Option<ExperimentTrackerConfig>,
    pub escalation_sentence: String,
    pub generator_version: String,
    #[serde(skip)]
    pub(crate) source_attribution: HashMap<String, ConfigSource>,
}

impl Config {
    #[must_use]
    pub fn builder() -> super::ConfigBuilder {
        super::ConfigBuilder::new()
    }

    /// Where a given config key's effective value came from — for
    /// diagnostics only, never for behavior.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default)
    }
}
