//! Library-level error types with rich context and user-friendly reporting.
//!
//! `PipelineError` is the primary error type returned by pipeline stages. It
//! maps directly onto the error taxonomy of the generation pipeline: every
//! row of that taxonomy (source IO, LLM transport/rate-limit, schema
//! violation, evidence mismatch, structural violation, coverage/integrity,
//! detection failure, write IO) is one variant here, with a fixed retry/
//! fatal/warning policy baked into [`PipelineError::to_exit_code`] and
//! [`PipelineError::is_fatal`].

use std::fmt;
use thiserror::Error;

/// Top-level error type for pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read source document: {0}")]
    SourceIo(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("failed to write artifact {path}: {reason}")]
    WriteIo { path: String, reason: String },

    #[error("validation failed with {error_count} error(s)")]
    ValidationFailed {
        errors: Vec<String>,
        error_count: usize,
    },

    #[error("pipeline stage '{stage}' aborted: {reason}")]
    StageFailed { stage: String, reason: String },
}

impl PipelineError {
    /// Whether this error should abort the pipeline outright (as opposed to
    /// being recorded as a warning and the run continuing).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        // Every variant that reaches `PipelineError` is, by construction,
        // fatal: non-fatal conditions (evidence mismatch, structural
        // violation, coverage gaps) are modeled as `Warning` values
        // collected alongside a successful stage result, never as errors.
        true
    }
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("missing required configuration: {0}")]
    MissingRequired(String),

    #[error("invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => format!("configuration file has invalid format: {reason}"),
            Self::MissingRequired(key) => format!("required configuration '{key}' is missing"),
            Self::InvalidValue { key, value } => {
                format!("configuration '{key}' has invalid value: {value}")
            }
            Self::DiscoveryFailed { reason } => format!("failed to discover configuration: {reason}"),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec!["check the TOML syntax of evalforge.toml".to_string()],
            Self::MissingRequired(key) => {
                vec![format!("set '{key}' in evalforge.toml or via CLI flag")]
            }
            Self::InvalidValue { key, .. } => {
                vec![format!("check the documentation for valid values of '{key}'")]
            }
            Self::DiscoveryFailed { .. } => vec![
                "pass --config <path> explicitly".to_string(),
                "ensure evalforge.toml is readable from the current directory".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors produced by LLM backend invocation and the structured-call layer.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// Transport-level failure (process spawn, HTTP connectivity, non-2xx).
    #[error("transport error: {0}")]
    Transport(String),

    /// Rate-limited by the provider; retryable with backoff.
    #[error("rate limited (retry_after={retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The provider returned a well-formed response that did not conform to
    /// the requested schema. Never retried automatically.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Retry budget was exhausted while chasing rate limits.
    #[error("retries exhausted after {attempts} attempt(s): {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// Configured spend limit was reached before this call could be made.
    #[error("budget exceeded: limit={limit}, attempted={attempted}")]
    BudgetExceeded { limit: u32, attempted: u32 },

    #[error("misconfiguration: {0}")]
    Misconfiguration(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl LlmError {
    /// Whether this error represents a condition the structured-call client
    /// should retry (only rate limits, per the retry policy).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Trait for providing user-friendly error reporting with context and suggestions.
pub trait UserFriendlyError {
    fn user_message(&self) -> String;

    fn suggestions(&self) -> Vec<String> {
        Vec::new()
    }

    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for grouping and reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    LlmIntegration,
    Extraction,
    Validation,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::LlmIntegration => write!(f, "LLM Integration"),
            Self::Extraction => write!(f, "Extraction"),
            Self::Validation => write!(f, "Validation"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_is_retryable() {
        let err = LlmError::RateLimited {
            retry_after_secs: Some(2),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn schema_violation_is_not_retryable() {
        let err = LlmError::SchemaViolation("missing field 'case'".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn config_error_user_message_mentions_key() {
        let err = ConfigError::MissingRequired("llm.provider".to_string());
        assert!(err.user_message().contains("llm.provider"));
    }
}
