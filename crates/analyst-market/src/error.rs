//! Error types for market-data retrieval

use thiserror::Error;

/// Market-data specific errors
#[derive(Debug, Error)]
pub enum MarketError {
    /// Symbol is unknown to the upstream
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Upstream answered but had nothing for the request
    #[error("No data returned for {symbol}")]
    NoData { symbol: String },

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    Yahoo(String),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantage(String),

    /// Finnhub API error
    #[error("Finnhub error: {0}")]
    Finnhub(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for market-data operations
pub type Result<T> = std::result::Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MarketError::RateLimitExceeded {
            provider: "Alpha Vantage".to_string(),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded for Alpha Vantage");

        let err = MarketError::NoData {
            symbol: "ZZZZ".to_string(),
        };
        assert_eq!(err.to_string(), "No data returned for ZZZZ");
    }
}
