//! Ticker symbols

use crate::{AnalysisError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static SYMBOL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9.^=\-]{1,12}$").unwrap());

/// Uppercase-normalized ticker symbol
///
/// Symbols are the unique key of every per-symbol map in an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Trim, uppercase and validate a raw ticker
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(AnalysisError::InvalidSymbol {
                symbol: raw.to_string(),
                reason: "symbol is empty".to_string(),
            });
        }

        if !SYMBOL_PATTERN.is_match(&normalized) {
            return Err(AnalysisError::InvalidSymbol {
                symbol: raw.to_string(),
                reason: "expected 1-12 characters of A-Z, 0-9, '.', '^', '=' or '-'".to_string(),
            });
        }

        Ok(Self(normalized))
    }

    /// Parse a list of raw tickers, dropping duplicates while keeping order
    pub fn parse_many<I, S>(raw: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut symbols: Vec<Self> = Vec::new();
        for item in raw {
            let symbol = Self::parse(item.as_ref())?;
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        if symbols.is_empty() {
            return Err(AnalysisError::NoSymbols);
        }
        Ok(symbols)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = AnalysisError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl FromStr for Symbol {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalization() {
        let symbol = Symbol::parse("  aapl ").unwrap();
        assert_eq!(symbol.as_str(), "AAPL");
        assert_eq!(Symbol::parse("brk.b").unwrap().to_string(), "BRK.B");
        assert_eq!(Symbol::parse("^gspc").unwrap().as_str(), "^GSPC");
    }

    #[test]
    fn test_invalid_symbols() {
        assert!(Symbol::parse("").is_err());
        assert!(Symbol::parse("   ").is_err());
        assert!(Symbol::parse("AA PL").is_err());
        assert!(Symbol::parse("THIS-IS-TOO-LONG").is_err());
    }

    #[test]
    fn test_parse_many_dedups() {
        let symbols = Symbol::parse_many(["aapl", "MSFT", "AAPL"]).unwrap();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].as_str(), "AAPL");
        assert_eq!(symbols[1].as_str(), "MSFT");
    }

    #[test]
    fn test_parse_many_empty() {
        let empty: Vec<&str> = Vec::new();
        assert!(matches!(
            Symbol::parse_many(empty),
            Err(AnalysisError::NoSymbols)
        ));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let symbol = Symbol::parse("nvda").unwrap();
        assert_eq!(serde_json::to_string(&symbol).unwrap(), "\"NVDA\"");
    }

    #[test]
    fn test_deserialize_normalizes() {
        let symbol: Symbol = serde_json::from_str("\" msft\"").unwrap();
        assert_eq!(symbol.as_str(), "MSFT");
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        assert!(serde_json::from_str::<Symbol>("\"AA PL\"").is_err());
        assert!(serde_json::from_str::<Symbol>("\"\"").is_err());
    }

    #[test]
    fn test_map_keys_round_trip() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(Symbol::parse("aapl").unwrap(), 1);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"AAPL":1}"#);

        let back: std::collections::BTreeMap<Symbol, i32> =
            serde_json::from_str(r#"{"aapl":1}"#).unwrap();
        assert!(back.contains_key(&Symbol::parse("AAPL").unwrap()));
    }
}
