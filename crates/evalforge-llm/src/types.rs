//! Core types for the LLM backend abstraction: messages, invocations,
//! results, and the `LlmBackend` trait every provider implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use evalforge_utils::error::LlmError;
use evalforge_utils::types::LlmInfo;

/// Role of a message in a conversation sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Input to a single backend invocation. `temperature` is not a field here
/// because the structured-call contract fixes it at 0 for every call — see
/// [`crate::call_structured`].
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Free-form tag used only for log correlation (e.g. `"use_case_extractor"`).
    pub stage: String,
    pub model: String,
    pub timeout: Duration,
    pub messages: Vec<Message>,
    pub seed: Option<u64>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(stage: impl Into<String>, model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            stage: stage.into(),
            model: model.into(),
            timeout: Duration::from_secs(120),
            messages,
            seed: None,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of a backend invocation: raw text plus bookkeeping metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    pub raw_response: String,
    pub provider: String,
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
        }
    }

    #[must_use]
    pub fn into_llm_info(self) -> LlmInfo {
        LlmInfo {
            provider: Some(self.provider),
            model_used: Some(self.model_used),
            tokens_input: self.tokens_input,
            tokens_output: self.tokens_output,
            timed_out: Some(false),
            timeout_seconds: None,
            budget_exhausted: None,
        }
    }
}

/// Trait every HTTP-based LLM provider implements. A single invocation is
/// one non-streaming completion; retries live one layer up, in
/// [`crate::call_structured`], because only that layer knows whether the
/// failure was a rate limit (retryable) or something else (not).
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;

    /// Provider name used in logs and `RunManifest.llm.provider`.
    fn provider_name(&self) -> &'static str;
}
