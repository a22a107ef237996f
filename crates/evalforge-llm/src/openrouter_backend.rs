//! HTTP backend for OpenRouter's OpenAI-compatible chat-completions API.
//! Used as the fallback provider when the primary (Anthropic) backend
//! cannot be constructed, and directly when configured as primary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use evalforge_config::BackendConfig;
use evalforge_utils::error::LlmError;

use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub(crate) struct OpenRouterBackend {
    client: HttpClient,
    base_url: String,
    api_key: String,
    max_tokens: u32,
}

impl OpenRouterBackend {
    pub(crate) fn from_config(config: &BackendConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .as_ref()
            .map(|s| s.expose().to_string())
            .ok_or_else(|| {
                LlmError::Misconfiguration(
                    "no OpenRouter API key available; set OPENROUTER_API_KEY or llm.api_key_env"
                        .to_string(),
                )
            })?;

        Ok(Self {
            client: HttpClient::new()?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            max_tokens: config.max_tokens,
        })
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| ChatMessage {
                role: match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                }
                .to_string(),
                content: m.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmBackend for OpenRouterBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        debug!(provider = "openrouter", model = %inv.model, stage = %inv.stage, "invoking");

        let body = ChatRequest {
            model: inv.model.clone(),
            messages: Self::convert_messages(&inv.messages),
            max_tokens: self.max_tokens,
            temperature: 0.0,
            seed: inv.seed,
        };

        let request = reqwest::Client::new()
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "openrouter")
            .await?;

        let response_body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("failed to parse OpenRouter response: {e}")))?;

        let choice = response_body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Transport("OpenRouter response had no choices".to_string()))?;

        let mut result = LlmResult::new(choice.message.content, "openrouter", inv.model);
        if let Some(usage) = response_body.usage {
            result.tokens_input = Some(usage.prompt_tokens);
            result.tokens_output = Some(usage.completion_tokens);
        }
        Ok(result)
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_messages_preserves_order_and_roles() {
        let messages = vec![Message::system("sys"), Message::user("hi")];
        let converted = OpenRouterBackend::convert_messages(&messages);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = BackendConfig {
            provider: evalforge_config::ProviderKind::OpenRouter,
            model: "anthropic/claude-sonnet-4-5".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: 2048,
        };
        assert!(OpenRouterBackend::from_config(&config).is_err());
    }
}
