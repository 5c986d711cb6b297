//! Chat-completion backend abstraction

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A hosted chat-completion API
///
/// [`ProviderGenerator`](crate::ProviderGenerator) adapts any provider into
/// the prompt-to-text capability the analysis stages use.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short lowercase name used in logs and errors
    fn name(&self) -> &str;
}
