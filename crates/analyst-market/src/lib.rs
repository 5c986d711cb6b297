//! Market-data capability for the equity analyst
//!
//! [`MarketDataService`] assembles a [`MarketSnapshot`](analyst_core::MarketSnapshot)
//! per symbol from three upstreams:
//!
//! - Yahoo Finance for OHLCV history (required)
//! - Alpha Vantage `OVERVIEW` for fundamentals (optional, needs an API key)
//! - Finnhub `company-news` for headlines (optional, needs an API key)
//!
//! [`CachedMarketData`] wraps any [`MarketDataProvider`] with a TTL cache.

pub mod alpha_vantage;
pub mod cache;
pub mod config;
pub mod error;
pub mod finnhub;
pub mod provider;
pub mod yahoo;

pub use alpha_vantage::{AlphaVantageClient, CompanyOverview};
pub use cache::{CachedMarketData, SnapshotCache, SnapshotKey};
pub use config::{MarketConfig, MarketConfigBuilder};
pub use error::{MarketError, Result};
pub use finnhub::{FinnhubClient, FinnhubNewsArticle};
pub use provider::{MarketDataProvider, MarketDataService};
pub use yahoo::YahooFinanceClient;
