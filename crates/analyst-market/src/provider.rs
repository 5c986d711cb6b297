//! Snapshot assembly across the market-data upstreams

use crate::alpha_vantage::AlphaVantageClient;
use crate::config::MarketConfig;
use crate::error::Result;
use crate::finnhub::FinnhubClient;
use crate::yahoo::YahooFinanceClient;
use analyst_core::{FundamentalMetrics, Interval, MarketSnapshot, NewsItem, Period, Symbol};
use async_trait::async_trait;
use tracing::{info, instrument, warn};

/// Anything that can produce a [`MarketSnapshot`] for a symbol
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Price history, fundamentals and headlines for one symbol
    async fn fetch(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<MarketSnapshot>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Live provider: Yahoo prices plus optional Alpha Vantage and Finnhub enrichment
///
/// Only the price history is mandatory. Fundamentals or news that fail to
/// load are logged and left empty.
pub struct MarketDataService {
    yahoo: YahooFinanceClient,
    alpha_vantage: Option<AlphaVantageClient>,
    finnhub: Option<FinnhubClient>,
    config: MarketConfig,
}

impl MarketDataService {
    pub fn from_config(config: MarketConfig) -> Result<Self> {
        config.validate()?;

        let alpha_vantage = config
            .alpha_vantage_api_key
            .as_ref()
            .map(|key| {
                AlphaVantageClient::new(
                    key.clone(),
                    config.alpha_vantage_rate_limit,
                    config.request_timeout,
                )
            })
            .transpose()?;

        let finnhub = config
            .finnhub_api_key
            .as_ref()
            .map(|key| {
                FinnhubClient::new(key.clone(), config.finnhub_rate_limit, config.request_timeout)
            })
            .transpose()?;

        if alpha_vantage.is_none() {
            info!("ALPHA_VANTAGE_API_KEY not set, fundamentals disabled");
        }
        if finnhub.is_none() {
            info!("FINNHUB_API_KEY not set, news disabled");
        }

        Ok(Self {
            yahoo: YahooFinanceClient::new()?,
            alpha_vantage,
            finnhub,
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(MarketConfig::from_env()?)
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    async fn fundamentals(&self, symbol: &Symbol) -> (Option<String>, FundamentalMetrics) {
        let Some(client) = &self.alpha_vantage else {
            return (None, FundamentalMetrics::default());
        };

        match client.company_overview(symbol).await {
            Ok(overview) => {
                let name = overview.name.clone().filter(|n| !n.trim().is_empty());
                (name, overview.to_metrics())
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "fundamentals unavailable");
                (None, FundamentalMetrics::default())
            }
        }
    }

    async fn news(&self, symbol: &Symbol) -> Vec<NewsItem> {
        let Some(client) = &self.finnhub else {
            return Vec::new();
        };

        client
            .recent_headlines(symbol, self.config.news_lookback_days, self.config.news_limit)
            .await
            .unwrap_or_else(|e| {
                warn!(symbol = %symbol, error = %e, "news unavailable");
                Vec::new()
            })
    }
}

#[async_trait]
impl MarketDataProvider for MarketDataService {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<MarketSnapshot> {
        let series = self.yahoo.price_history(symbol, period, interval).await?;
        let ((name, fundamentals), news) =
            tokio::join!(self.fundamentals(symbol), self.news(symbol));

        let mut snapshot = MarketSnapshot::new(symbol.clone(), series)
            .with_fundamentals(fundamentals)
            .with_news(news);
        if let Some(name) = name {
            snapshot = snapshot.with_company_name(name);
        }

        Ok(snapshot)
    }

    fn name(&self) -> &str {
        "market-data"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_without_keys() {
        let config = MarketConfig::builder().build().unwrap();
        let service = MarketDataService::from_config(config).unwrap();
        assert!(service.alpha_vantage.is_none());
        assert!(service.finnhub.is_none());
        assert_eq!(service.name(), "market-data");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_live() {
        let service = MarketDataService::from_config(MarketConfig::default()).unwrap();
        let symbol = Symbol::parse("MSFT").unwrap();
        let snapshot = service
            .fetch(&symbol, Period::OneMonth, Interval::OneDay)
            .await
            .unwrap();
        assert!(!snapshot.series.is_empty());
        assert!(snapshot.current_price.is_some());
    }
}
