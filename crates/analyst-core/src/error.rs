//! Error types for analysis runs

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors raised while preparing or running an analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No symbols were supplied for the run
    #[error("At least one symbol is required")]
    NoSymbols,

    /// Symbol failed validation
    #[error("Invalid symbol '{symbol}': {reason}")]
    InvalidSymbol { symbol: String, reason: String },

    /// Unknown period string
    #[error("Invalid period '{0}'")]
    InvalidPeriod(String),

    /// Unknown interval string
    #[error("Invalid interval '{0}'")]
    InvalidInterval(String),

    /// Unknown analysis type string
    #[error("Invalid analysis type '{0}'")]
    InvalidAnalysisType(String),

    /// Market data could not be retrieved for a symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Indicator or scoring computation failed
    #[error("Computation failed for {symbol}: {reason}")]
    Computation { symbol: String, reason: String },

    /// Text generation failed or returned nothing usable
    #[error("Text generation failed: {0}")]
    Generation(String),

    /// Chart rendering failed for a symbol
    #[error("Chart rendering failed for {symbol}: {reason}")]
    Render { symbol: String, reason: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller cancelled the run between stages
    #[error("Analysis cancelled before {0}")]
    Cancelled(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Build a [`AnalysisError::Computation`] for a symbol
    pub fn computation(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Computation {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`AnalysisError::DataUnavailable`] for a symbol
    pub fn data_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// [`AnalysisError::DataUnavailable`] for a fetch that outlived `limit`
    pub fn fetch_timeout(symbol: impl Into<String>, limit: Duration) -> Self {
        Self::data_unavailable(symbol, format!("timed out after {limit:?}"))
    }

    /// Build a [`AnalysisError::Render`] for a symbol
    pub fn render(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Render {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Taxonomy bucket of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            Self::Computation { .. } => ErrorKind::Computation,
            Self::Generation(_) => ErrorKind::Generation,
            Self::Render { .. } => ErrorKind::Render,
            Self::NoSymbols
            | Self::InvalidSymbol { .. }
            | Self::InvalidPeriod(_)
            | Self::InvalidInterval(_)
            | Self::InvalidAnalysisType(_)
            | Self::Config(_) => ErrorKind::Validation,
            Self::Cancelled(_) | Self::Io(_) | Self::Json(_) => ErrorKind::Internal,
        }
    }
}

/// Coarse classification recorded alongside each logged failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DataUnavailable,
    Computation,
    Generation,
    Render,
    Validation,
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::data_unavailable("AAPL", "HTTP 404");
        assert_eq!(err.to_string(), "Data not available for AAPL: HTTP 404");

        let err = AnalysisError::fetch_timeout("MSFT", Duration::from_secs(30));
        assert_eq!(err.to_string(), "Data not available for MSFT: timed out after 30s");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            AnalysisError::computation("MSFT", "NaN close").kind(),
            ErrorKind::Computation
        );
        assert_eq!(AnalysisError::NoSymbols.kind(), ErrorKind::Validation);
        assert_eq!(
            AnalysisError::Generation("boom".into()).kind(),
            ErrorKind::Generation
        );
        assert_eq!(
            AnalysisError::fetch_timeout("MSFT", Duration::from_millis(20)).kind(),
            ErrorKind::DataUnavailable
        );
    }
}
