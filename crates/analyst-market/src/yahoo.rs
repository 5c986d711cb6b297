//! Yahoo Finance price history client

use crate::error::{MarketError, Result};
use analyst_core::{Interval, Period, PriceBar, PriceSeries, Symbol};
use chrono::DateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

/// Yahoo Finance chart API client
pub struct YahooFinanceClient {
    connector: yahoo::YahooConnector,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Result<Self> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| MarketError::Yahoo(e.to_string()))?;
        Ok(Self { connector })
    }

    /// OHLCV history for `symbol` over `period` at `interval` bar size
    #[instrument(skip(self), fields(symbol = %symbol, period = %period, interval = %interval))]
    pub async fn price_history(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<PriceSeries> {
        let response = self
            .connector
            .get_quote_range(symbol.as_str(), interval.as_str(), period.as_str())
            .await
            .map_err(|e| MarketError::Yahoo(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| MarketError::Yahoo(e.to_string()))?;

        let bars: Vec<PriceBar> = quotes.iter().filter_map(to_bar).collect();
        debug!("{} quotes received, {} usable bars", quotes.len(), bars.len());

        if bars.is_empty() {
            return Err(MarketError::NoData {
                symbol: symbol.to_string(),
            });
        }

        Ok(PriceSeries::new(bars))
    }
}

/// Quotes with an out-of-range timestamp or a non-finite close are dropped
fn to_bar(quote: &yahoo::Quote) -> Option<PriceBar> {
    let seconds = i64::try_from(quote.timestamp).ok()?;
    let timestamp = DateTime::from_timestamp(seconds, 0)?;
    if !quote.close.is_finite() {
        return None;
    }

    Some(PriceBar {
        timestamp,
        open: quote.open,
        high: quote.high,
        low: quote.low,
        close: quote.close,
        volume: quote.volume,
    })
}
