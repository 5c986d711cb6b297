//! Hosted chat-completion backends
//!
//! Both providers share [`ApiConfig`] and the request/status handling in
//! [`post_json`]; they differ only in wire shapes.

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;
#[cfg(feature = "openai")]
pub use openai::OpenAIProvider;

use crate::{LLMError, Result};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Credentials and endpoint for one provider
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    /// Base URL, without a trailing slash
    pub api_base: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: api_base.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Key from `key_var` (required), base URL from `base_var` or `default_base`
    pub fn from_env(key_var: &str, base_var: &str, default_base: &str) -> Result<Self> {
        let api_key = std::env::var(key_var)
            .map_err(|_| LLMError::Config(format!("{key_var} environment variable not set")))?;
        let api_base = std::env::var(base_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_base.to_string());
        Ok(Self::new(api_key, api_base))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(LLMError::Config("API key is empty".to_string()));
        }
        url::Url::parse(&self.api_base)
            .map_err(|e| LLMError::Config(format!("invalid api_base '{}': {e}", self.api_base)))?;
        if self.timeout.is_zero() {
            return Err(LLMError::Config("timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// `{api_base}/{path}`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base.trim_end_matches('/'))
    }

    fn client(&self) -> Result<Client> {
        self.validate()?;
        Ok(Client::builder().timeout(self.timeout).build()?)
    }
}

/// Send `body` and decode a JSON reply, classifying non-success statuses
async fn post_json<Req, Resp>(
    provider: &'static str,
    model: &str,
    request: RequestBuilder,
    body: &Req,
) -> Result<Resp>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let response = request.json(body).send().await?;
    let status = response.status();
    debug!(provider, %status, "response received");

    if !status.is_success() {
        let text = response.text().await?;
        return Err(LLMError::from_status(provider, status.as_u16(), text, model));
    }

    response
        .json::<Resp>()
        .await
        .map_err(|e| LLMError::Decode(format!("{provider}: {e}")))
}
