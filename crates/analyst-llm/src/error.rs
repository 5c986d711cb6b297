//! Error types for text generation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LLMError>;

#[derive(Error, Debug)]
pub enum LLMError {
    /// Non-success HTTP status not covered by a more specific variant
    #[error("{provider} returned HTTP {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} rejected the API key")]
    Unauthorized { provider: &'static str },

    #[error("{provider} rate limit exceeded: {body}")]
    RateLimited { provider: &'static str, body: String },

    #[error("Model not available: {0}")]
    UnknownModel(String),

    #[cfg(any(feature = "anthropic", feature = "openai"))]
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The model answered with no usable text
    #[error("Empty completion from {0}")]
    EmptyCompletion(String),

    #[error("LLM configuration error: {0}")]
    Config(String),
}

impl LLMError {
    /// Classify a failed HTTP exchange
    pub fn from_status(provider: &'static str, status: u16, body: String, model: &str) -> Self {
        match status {
            401 | 403 => LLMError::Unauthorized { provider },
            404 => LLMError::UnknownModel(model.to_string()),
            429 => LLMError::RateLimited { provider, body },
            _ => LLMError::Api {
                provider,
                status,
                body,
            },
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LLMError::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            LLMError::from_status("openai", 401, String::new(), "gpt-4"),
            LLMError::Unauthorized { provider: "openai" }
        ));
        assert!(LLMError::from_status("openai", 429, "slow".into(), "gpt-4").is_rate_limited());
        assert!(matches!(
            LLMError::from_status("anthropic", 404, String::new(), "claude-x"),
            LLMError::UnknownModel(m) if m == "claude-x"
        ));

        let err = LLMError::from_status("anthropic", 529, "overloaded".into(), "claude-x");
        assert_eq!(err.to_string(), "anthropic returned HTTP 529: overloaded");
    }
}
