//! Configuration for market-data retrieval

use crate::error::{MarketError, Result};
use analyst_utils::env_parse;
use std::time::Duration;

/// Settings for the market-data upstreams
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Alpha Vantage API key; fundamentals are skipped when absent
    pub alpha_vantage_api_key: Option<String>,

    /// Finnhub API key; news is skipped when absent
    pub finnhub_api_key: Option<String>,

    /// Alpha Vantage requests per minute (free tier: 5)
    pub alpha_vantage_rate_limit: u32,

    /// Finnhub requests per minute (free tier: 60)
    pub finnhub_rate_limit: u32,

    /// Lifetime of cached snapshots
    pub cache_ttl: Duration,

    /// Whether snapshots are cached at all
    pub enable_cache: bool,

    /// Maximum headlines kept per symbol
    pub news_limit: usize,

    /// How far back to look for headlines
    pub news_lookback_days: i64,

    /// HTTP timeout for the REST upstreams
    pub request_timeout: Duration,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            finnhub_api_key: None,
            alpha_vantage_rate_limit: 5,
            finnhub_rate_limit: 60,
            cache_ttl: Duration::from_secs(300),
            enable_cache: true,
            news_limit: 5,
            news_lookback_days: 7,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl MarketConfig {
    /// Create a new configuration builder
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::default()
    }

    /// Defaults overridden by environment variables
    ///
    /// Reads `ALPHA_VANTAGE_API_KEY`, `FINNHUB_API_KEY`,
    /// `MARKET_CACHE_TTL_SECS` and `MARKET_NEWS_LIMIT`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            alpha_vantage_api_key: non_empty_var("ALPHA_VANTAGE_API_KEY"),
            finnhub_api_key: non_empty_var("FINNHUB_API_KEY"),
            ..Self::default()
        };

        if let Some(ttl) = env_parse::<u64>("MARKET_CACHE_TTL_SECS").map_err(MarketError::Config)? {
            config.cache_ttl = Duration::from_secs(ttl);
            config.enable_cache = ttl > 0;
        }
        if let Some(limit) = env_parse::<usize>("MARKET_NEWS_LIMIT").map_err(MarketError::Config)? {
            config.news_limit = limit;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.alpha_vantage_rate_limit == 0 || self.finnhub_rate_limit == 0 {
            return Err(MarketError::Config(
                "rate limits must be greater than 0".to_string(),
            ));
        }

        if self.enable_cache && self.cache_ttl.is_zero() {
            return Err(MarketError::Config(
                "cache_ttl must be non-zero when caching is enabled".to_string(),
            ));
        }

        if self.news_lookback_days <= 0 {
            return Err(MarketError::Config(
                "news_lookback_days must be positive".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(MarketError::Config(
                "request_timeout must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for MarketConfig
#[derive(Debug, Default)]
pub struct MarketConfigBuilder {
    alpha_vantage_api_key: Option<String>,
    finnhub_api_key: Option<String>,
    alpha_vantage_rate_limit: Option<u32>,
    finnhub_rate_limit: Option<u32>,
    cache_ttl: Option<Duration>,
    enable_cache: Option<bool>,
    news_limit: Option<usize>,
    news_lookback_days: Option<i64>,
    request_timeout: Option<Duration>,
}

impl MarketConfigBuilder {
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    pub fn finnhub_api_key(mut self, key: impl Into<String>) -> Self {
        self.finnhub_api_key = Some(key.into());
        self
    }

    pub fn alpha_vantage_rate_limit(mut self, per_minute: u32) -> Self {
        self.alpha_vantage_rate_limit = Some(per_minute);
        self
    }

    pub fn finnhub_rate_limit(mut self, per_minute: u32) -> Self {
        self.finnhub_rate_limit = Some(per_minute);
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn enable_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = Some(enabled);
        self
    }

    pub fn news_limit(mut self, limit: usize) -> Self {
        self.news_limit = Some(limit);
        self
    }

    pub fn news_lookback_days(mut self, days: i64) -> Self {
        self.news_lookback_days = Some(days);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<MarketConfig> {
        let defaults = MarketConfig::default();
        let config = MarketConfig {
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            finnhub_api_key: self.finnhub_api_key,
            alpha_vantage_rate_limit: self
                .alpha_vantage_rate_limit
                .unwrap_or(defaults.alpha_vantage_rate_limit),
            finnhub_rate_limit: self.finnhub_rate_limit.unwrap_or(defaults.finnhub_rate_limit),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            enable_cache: self.enable_cache.unwrap_or(defaults.enable_cache),
            news_limit: self.news_limit.unwrap_or(defaults.news_limit),
            news_lookback_days: self.news_lookback_days.unwrap_or(defaults.news_lookback_days),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MarketConfig::default();
        assert_eq!(config.alpha_vantage_rate_limit, 5);
        assert_eq!(config.finnhub_rate_limit, 60);
        assert_eq!(config.news_limit, 5);
        assert!(config.enable_cache);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = MarketConfig::builder()
            .alpha_vantage_api_key("av-key")
            .cache_ttl(Duration::from_secs(60))
            .news_limit(3)
            .build()
            .unwrap();

        assert_eq!(config.alpha_vantage_api_key.as_deref(), Some("av-key"));
        assert!(config.finnhub_api_key.is_none());
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.news_limit, 3);
    }

    #[test]
    fn test_validation_rejects_zero_rate_limit() {
        let result = MarketConfig::builder().finnhub_rate_limit(0).build();
        assert!(matches!(result, Err(MarketError::Config(_))));
    }

    #[test]
    fn test_cache_can_be_disabled() {
        let config = MarketConfig::builder()
            .enable_cache(false)
            .cache_ttl(Duration::ZERO)
            .build()
            .unwrap();
        assert!(!config.enable_cache);
    }
}
