//! Text generation for the analysis stages
//!
//! The stages only see [`TextGenerator`]: a system prompt and a user prompt
//! in, text out. [`ProviderGenerator`] implements it over any
//! [`LLMProvider`]; OpenAI-compatible and Anthropic backends live in
//! [`providers`] behind feature flags.

pub mod completion;
pub mod error;
pub mod generator;
pub mod messages;
pub mod provider;

#[cfg(any(feature = "anthropic", feature = "openai"))]
pub mod providers;

pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use generator::{ProviderGenerator, TextGenerator};
pub use messages::{Message, Role};
pub use provider::LLMProvider;
