//! Text-generation capability
//!
//! Analysis stages do not care which provider answers or how a request is
//! shaped. They hand over a system prompt and a user prompt and expect text
//! back, one request per call with no conversation state.

use crate::{CompletionRequest, LLMError, LLMProvider, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Single-shot prompt to text capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send one system + user prompt pair and return the model's text unmodified
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// [`TextGenerator`] backed by an [`LLMProvider`]
pub struct ProviderGenerator {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: usize,
    temperature: Option<f32>,
}

impl ProviderGenerator {
    /// Create a generator for `model` with 2048 max tokens and the provider's
    /// default temperature
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 2048,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for ProviderGenerator {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let mut request = CompletionRequest::new(&self.model, user_prompt)
            .with_system(system_prompt)
            .with_max_tokens(self.max_tokens);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let response = self.provider.complete(request).await?;
        debug!(
            "completion finished: {:?}, {} tokens",
            response.stop_reason,
            response.usage.total()
        );
        if response.stop_reason.is_truncated() {
            warn!(max_tokens = self.max_tokens, "completion cut at the token limit");
        }

        response
            .message
            .text()
            .map(ToString::to_string)
            .ok_or_else(|| LLMError::EmptyCompletion(self.model.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompletionResponse, Message, StopReason, TokenUsage};
    use std::sync::Mutex;

    struct RecordingProvider {
        reply: String,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl RecordingProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for RecordingProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(CompletionResponse {
                message: Message::assistant(self.reply.clone()),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 5,
                },
            })
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_generate_builds_single_turn_request() {
        let provider = Arc::new(RecordingProvider::new("Bullish - strong momentum"));
        let generator = ProviderGenerator::new(provider.clone(), "gpt-4")
            .with_temperature(0.1)
            .with_max_tokens(512);

        let text = generator
            .generate("You are a financial analyst.", "Assess AAPL")
            .await
            .unwrap();
        assert_eq!(text, "Bullish - strong momentum");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gpt-4");
        assert_eq!(seen[0].system.as_deref(), Some("You are a financial analyst."));
        assert_eq!(seen[0].messages, vec![Message::user("Assess AAPL")]);
        assert_eq!(seen[0].max_tokens, 512);
        assert_eq!(seen[0].temperature, Some(0.1));
    }

    #[tokio::test]
    async fn test_blank_reply_is_an_error() {
        let generator = ProviderGenerator::new(Arc::new(RecordingProvider::new("   ")), "gpt-4");
        let result = generator.generate("sys", "user").await;
        assert!(matches!(result, Err(LLMError::EmptyCompletion(_))));
    }
}
