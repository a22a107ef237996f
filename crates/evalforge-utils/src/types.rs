//! Small shared types used across pipeline crates.

use serde::{Deserialize, Serialize};

/// LLM invocation metadata, carried into `RunManifest.llm` and into
/// per-example `metadata.generator` bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_input: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_output: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_exhausted: Option<bool>,
}

impl LlmInfo {
    /// Build an `LlmInfo` for a call that never reached the provider because
    /// a configured spend limit was already exhausted.
    #[must_use]
    pub fn for_budget_exhaustion() -> Self {
        Self {
            provider: None,
            model_used: None,
            tokens_input: None,
            tokens_output: None,
            timed_out: None,
            timeout_seconds: None,
            budget_exhausted: Some(true),
        }
    }
}

/// Where a configuration value ultimately came from — used only for
/// diagnostics (`evalforge status`-style introspection), never to change
/// behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    Cli,
    File,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::File => write!(f, "file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// A non-fatal issue surfaced during generation or standalone validation.
/// Generation-time warnings and validation-time errors share this shape;
/// only the caller's interpretation of severity differs: the same
/// condition is a warning during `generate` and an error during `validate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    pub code: String,
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_exhaustion_sets_flag_only() {
        let info = LlmInfo::for_budget_exhaustion();
        assert_eq!(info.budget_exhausted, Some(true));
        assert!(info.provider.is_none());
    }

    #[test]
    fn config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "cli");
    }
}
