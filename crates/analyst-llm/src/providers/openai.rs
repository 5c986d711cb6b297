//! OpenAI Chat Completions provider
//!
//! Any OpenAI-compatible server (llama.cpp, vLLM, LM Studio) works by
//! pointing `OPENAI_API_BASE` at it.
//!
//! ```no_run
//! use analyst_llm::{ProviderGenerator, TextGenerator};
//! use analyst_llm::providers::OpenAIProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> analyst_llm::Result<()> {
//! let provider = Arc::new(OpenAIProvider::from_env()?);
//! let generator = ProviderGenerator::new(provider, "gpt-4").with_temperature(0.1);
//! let text = generator
//!     .generate("You are a financial analyst.", "Summarize AAPL in one line.")
//!     .await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

use super::{ApiConfig, post_json};
use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAIProvider {
    client: Client,
    config: ApiConfig,
}

impl OpenAIProvider {
    pub fn with_config(config: ApiConfig) -> Result<Self> {
        let client = config.client()?;
        Ok(Self { client, config })
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ApiConfig::new(api_key, OPENAI_API_BASE))
    }

    /// `OPENAI_API_KEY`, with `OPENAI_API_BASE` overriding the endpoint
    pub fn from_env() -> Result<Self> {
        Self::with_config(ApiConfig::from_env(
            "OPENAI_API_KEY",
            "OPENAI_API_BASE",
            OPENAI_API_BASE,
        )?)
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip_all, fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = ChatRequest::from_completion(&request);
        let http = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key);

        let reply: ChatResponse = post_json("openai", &request.model, http, &body).await?;
        reply.into_completion()
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatRequest<'a> {
    /// The system prompt becomes the leading `system` message
    fn from_completion(request: &'a CompletionRequest) -> Self {
        let system = request.system.as_deref().map(|content| ChatMessage {
            role: "system",
            content,
        });
        let turns = request.messages.iter().map(|m| ChatMessage {
            role: m.role.as_str(),
            content: &m.content,
        });

        Self {
            model: &request.model,
            messages: system.into_iter().chain(turns).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: ChatUsage,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

impl ChatResponse {
    fn into_completion(self) -> Result<CompletionResponse> {
        let usage = TokenUsage {
            input_tokens: self.usage.prompt_tokens,
            output_tokens: self.usage.completion_tokens,
        };
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::Decode("openai: response has no choices".to_string()))?;

        let stop_reason = match choice.finish_reason.as_deref() {
            Some("stop") => StopReason::EndTurn,
            Some("length") => StopReason::MaxTokens,
            other => {
                debug!("finish reason {other:?}");
                StopReason::Other
            }
        };

        Ok(CompletionResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            stop_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_provider_defaults() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_base, OPENAI_API_BASE);
        assert!(OpenAIProvider::new("").is_err());
    }

    #[test]
    fn test_local_server_config() {
        let config = ApiConfig::new("not-needed", "http://localhost:1234/v1")
            .with_timeout(Duration::from_secs(180));
        let provider = OpenAIProvider::with_config(config).unwrap();
        assert_eq!(
            provider.config().endpoint("chat/completions"),
            "http://localhost:1234/v1/chat/completions"
        );
        assert_eq!(provider.config().timeout, Duration::from_secs(180));
    }

    #[test]
    fn test_request_body() {
        let request = CompletionRequest::new("gpt-4", "Recommend for AAPL, MSFT")
            .with_system("You are a portfolio manager providing investment recommendations.")
            .with_max_tokens(2048)
            .with_temperature(0.1);

        let value = serde_json::to_value(ChatRequest::from_completion(&request)).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "You are a portfolio manager providing investment recommendations."},
                    {"role": "user", "content": "Recommend for AAPL, MSFT"}
                ],
                "max_tokens": 2048,
                "temperature": 0.1_f32
            })
        );
    }

    #[test]
    fn test_reply_conversion() {
        let reply: ChatResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Neutral outlook"},
                "finish_reason": "length"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        }))
        .unwrap();

        let completion = reply.into_completion().unwrap();
        assert_eq!(completion.message.text(), Some("Neutral outlook"));
        assert!(completion.stop_reason.is_truncated());
        assert_eq!(completion.usage.total(), 15);
    }

    #[test]
    fn test_reply_without_choices() {
        let reply: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(reply.into_completion(), Err(LLMError::Decode(_))));
    }
}
