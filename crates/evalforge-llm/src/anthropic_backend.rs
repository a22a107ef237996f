//! HTTP backend for Anthropic's Messages API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use evalforge_config::BackendConfig;
use evalforge_utils::error::LlmError;

use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub(crate) struct AnthropicBackend {
    client: HttpClient,
    base_url: String,
    api_key: String,
    max_tokens: u32,
}

impl AnthropicBackend {
    pub(crate) fn from_config(config: &BackendConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .as_ref()
            .map(|s| s.expose().to_string())
            .ok_or_else(|| {
                LlmError::Misconfiguration(
                    "no Anthropic API key available; set ANTHROPIC_API_KEY or llm.api_key_env"
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

    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_prompt: Option<String> = None;
        let mut out = Vec::new();
        for msg in messages {
            match msg.role {
                Role::System => {
                    if let Some(existing) = system_prompt.as_mut() {
                        existing.push_str("\n\n");
                        existing.push_str(&msg.content);
                    } else {
                        system_prompt = Some(msg.content.clone());
                    }
                }
                Role::User => out.push(AnthropicMessage {
                    role: "user".to_string(),
                    content: msg.content.clone(),
                }),
                Role::Assistant => out.push(AnthropicMessage {
                    role: "assistant".to_string(),
                    content: msg.content.clone(),
                }),
            }
        }
        (system_prompt, out)
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (system, messages) = Self::convert_messages(&inv.messages);

        debug!(provider = "anthropic", model = %inv.model, stage = %inv.stage, "invoking");

        let body = AnthropicRequest {
            model: inv.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: 0.0,
            system,
        };

        let request = reqwest::Client::new()
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "anthropic")
            .await?;

        let response_body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("failed to parse Anthropic response: {e}")))?;

        let content: String = response_body
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.clone())
            .collect();

        if content.is_empty() {
            return Err(LlmError::Transport(
                "Anthropic response contained no text content".to_string(),
            ));
        }

        let mut result = LlmResult::new(content, "anthropic", inv.model);
        if let Some(usage) = response_body.usage {
            result.tokens_input = Some(usage.input_tokens);
            result.tokens_output = Some(usage.output_tokens);
        }
        Ok(result)
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_messages_separates_system_and_concatenates() {
        let messages = vec![
            Message::new(Role::System, "first"),
            Message::new(Role::System, "second"),
            Message::new(Role::User, "hi"),
        ];
        let (system, converted) = AnthropicBackend::convert_messages(&messages);
        assert_eq!(system, Some("first\n\nsecond".to_string()));
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, "user");
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = BackendConfig {
            provider: evalforge_config::ProviderKind::Anthropic,
            model: "claude-sonnet-4-5".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: 2048,
        };
        assert!(AnthropicBackend::from_config(&config).is_err());
    }
}
