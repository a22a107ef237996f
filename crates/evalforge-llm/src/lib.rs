//! LLM backend abstraction and the structured-call contract.
//!
//! A single public entry point, [`call_structured`], wraps provider
//! selection, the retry policy ([`http_client`]), and JSON-Schema
//! conformance checking so every caller in the pipeline gets identical
//! semantics regardless of which provider answered.

mod anthropic_backend;
mod http_client;
mod openrouter_backend;
mod types;

pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

use std::sync::Arc;

use evalforge_config::{BackendConfig, LlmConfig, ProviderKind};
use evalforge_utils::error::LlmError;
use jsonschema::Validator;
use tracing::{info, warn};

use anthropic_backend::AnthropicBackend;
use openrouter_backend::OpenRouterBackend;

fn build_backend(config: &BackendConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
    match config.provider {
        ProviderKind::Anthropic => Ok(Arc::new(AnthropicBackend::from_config(config)?)),
        ProviderKind::OpenRouter => Ok(Arc::new(OpenRouterBackend::from_config(config)?)),
    }
}

/// A resolved pair of backends: the primary used for every call, and an
/// optional fallback substituted only when the primary failed to
/// *construct* (missing key, unsupported provider) — never for a runtime
/// or rate-limit failure during a call.
pub struct BackendPair {
    primary: Arc<dyn LlmBackend>,
}

impl BackendPair {
    /// Build the primary backend from `llm.primary`, falling back to
    /// `llm.fallback` only if construction of the primary fails. Mirrors the
    /// teacher's `from_config_with_fallback` shape, narrowed to
    /// construction-time fallback only.
    pub fn from_config(llm: &LlmConfig) -> Result<Self, LlmError> {
        match build_backend(&llm.primary) {
            Ok(backend) => Ok(Self { primary: backend }),
            Err(primary_err) => {
                let Some(fallback_config) = llm.fallback.as_ref() else {
                    return Err(primary_err);
                };
                warn!(
                    error = %primary_err,
                    "primary LLM backend failed to construct, using fallback"
                );
                let backend = build_backend(fallback_config)?;
                Ok(Self { primary: backend })
            }
        }
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn LlmBackend> {
        Arc::clone(&self.primary)
    }
}

/// Issue one structured-output call: temperature fixed at 0, `seed` passed
/// through to the provider when it supports one, and the raw response
/// validated against `response_schema` before being handed back. A schema
/// violation is never retried — it means the model ignored instructions, not
/// that the request should be repeated.
pub async fn call_structured(
    backend: &dyn LlmBackend,
    stage: impl Into<String>,
    model: impl Into<String>,
    messages: Vec<Message>,
    seed: Option<u64>,
    response_schema: &serde_json::Value,
) -> Result<serde_json::Value, LlmError> {
    let stage = stage.into();
    let invocation = LlmInvocation::new(stage.clone(), model, messages).with_seed(seed);

    let result = backend.invoke(invocation).await?;

    let parsed: serde_json::Value = serde_json::from_str(result.raw_response.trim())
        .map_err(|e| LlmError::SchemaViolation(format!("response was not valid JSON: {e}")))?;

    let validator = Validator::new(response_schema).map_err(|e| {
        LlmError::Misconfiguration(format!("invalid response schema for {stage}: {e}"))
    })?;

    if let Err(error) = validator.validate(&parsed) {
        return Err(LlmError::SchemaViolation(format!(
            "{stage} response failed schema validation: {error}"
        )));
    }

    info!(
        provider = result.provider,
        model = result.model_used,
        stage = stage,
        "structured call succeeded"
    );

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubBackend {
        response: String,
    }

    #[async_trait]
    impl LlmBackend for StubBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Ok(LlmResult::new(self.response.clone(), "stub", "stub-model"))
        }

        fn provider_name(&self) -> &'static str {
            "stub"
        }
    }

    #[tokio::test]
    async fn call_structured_accepts_conforming_json() {
        let backend = StubBackend {
            response: r#"{"name": "alice"}"#.to_string(),
        };
        let schema = serde_json::json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        let result = call_structured(
            &backend,
            "test_stage",
            "stub-model",
            vec![Message::user("hi")],
            Some(42),
            &schema,
        )
        .await
        .unwrap();
        assert_eq!(result["name"], "alice");
    }

    #[tokio::test]
    async fn call_structured_rejects_schema_violation() {
        let backend = StubBackend {
            response: r#"{"name": 5}"#.to_string(),
        };
        let schema = serde_json::json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        let err = call_structured(
            &backend,
            "test_stage",
            "stub-model",
            vec![Message::user("hi")],
            None,
            &schema,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LlmError::SchemaViolation(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn call_structured_rejects_non_json() {
        let backend = StubBackend {
            response: "not json at all".to_string(),
        };
        let schema = serde_json::json!({ "type": "object" });
        let err = call_structured(
            &backend,
            "test_stage",
            "stub-model",
            vec![Message::user("hi")],
            None,
            &schema,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LlmError::SchemaViolation(_)));
    }
}
