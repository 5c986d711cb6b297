//! Anthropic Messages API provider
//!
//! See: https://docs.anthropic.com/en/api/messages

use super::{ApiConfig, post_json};
use crate::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, Result, StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    config: ApiConfig,
}

impl AnthropicProvider {
    pub fn with_config(config: ApiConfig) -> Result<Self> {
        let client = config.client()?;
        Ok(Self { client, config })
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ApiConfig::new(api_key, ANTHROPIC_API_BASE))
    }

    /// `ANTHROPIC_API_KEY`, with `ANTHROPIC_API_BASE` overriding the endpoint
    pub fn from_env() -> Result<Self> {
        Self::with_config(ApiConfig::from_env(
            "ANTHROPIC_API_KEY",
            "ANTHROPIC_API_BASE",
            ANTHROPIC_API_BASE,
        )?)
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = MessagesRequest {
            model: &request.model,
            messages: &request.messages,
            system: request.system.as_deref(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let http = self
            .client
            .post(self.config.endpoint("messages"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);

        let reply: MessagesResponse = post_json("anthropic", &request.model, http, &body).await?;
        Ok(reply.into_completion())
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: MessagesUsage,
}

/// Only text blocks carry analysis output
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: usize,
    output_tokens: usize,
}

impl MessagesResponse {
    fn into_completion(self) -> CompletionResponse {
        let text = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        let stop_reason = match self.stop_reason.as_deref() {
            Some("end_turn") => StopReason::EndTurn,
            Some("max_tokens") => StopReason::MaxTokens,
            other => {
                debug!("stop reason {other:?}");
                StopReason::Other
            }
        };

        CompletionResponse {
            message: Message::assistant(text),
            stop_reason,
            usage: TokenUsage {
                input_tokens: self.usage.input_tokens,
                output_tokens: self.usage.output_tokens,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = AnthropicProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(
            provider.config().endpoint("messages"),
            "https://api.anthropic.com/v1/messages"
        );
        assert!(AnthropicProvider::new(" ").is_err());
    }

    #[test]
    fn test_reply_joins_text_blocks() {
        let reply: MessagesResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Hold"},
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Risk: moderate"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 20, "output_tokens": 4}
        }))
        .unwrap();

        let completion = reply.into_completion();
        assert_eq!(completion.message.text(), Some("Hold\nRisk: moderate"));
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert_eq!(completion.usage.total(), 24);
    }

    #[test]
    fn test_request_carries_system_separately() {
        let request = CompletionRequest::new("claude-sonnet-4-5", "Assess MSFT")
            .with_system("You are a risk management specialist.")
            .with_max_tokens(256);
        let body = MessagesRequest {
            model: &request.model,
            messages: &request.messages,
            system: request.system.as_deref(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["system"], "You are a risk management specialist.");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "Assess MSFT");
        assert!(value.get("temperature").is_none());
    }
}
