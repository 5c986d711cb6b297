//! Alpha Vantage company-overview client

use crate::error::{MarketError, Result};
use analyst_core::{FundamentalMetrics, Symbol};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const BASE_URL: &str = "https://www.alphavantage.co/query";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

/// `OVERVIEW` payload; Alpha Vantage sends every number as a string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    pub market_cap: Option<String>,
    #[serde(rename = "PERatio")]
    pub pe_ratio: Option<String>,
    #[serde(rename = "ForwardPE")]
    pub forward_pe: Option<String>,
    pub price_to_book_ratio: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM")]
    pub return_on_equity: Option<String>,
    #[serde(rename = "ReturnOnAssetsTTM")]
    pub return_on_assets: Option<String>,
    pub profit_margin: Option<String>,
    #[serde(rename = "QuarterlyRevenueGrowthYOY")]
    pub revenue_growth: Option<String>,
    #[serde(rename = "QuarterlyEarningsGrowthYOY")]
    pub earnings_growth: Option<String>,
    pub dividend_yield: Option<String>,
    pub beta: Option<String>,
    #[serde(rename = "52WeekHigh")]
    pub week_52_high: Option<String>,
    #[serde(rename = "52WeekLow")]
    pub week_52_low: Option<String>,
}

impl CompanyOverview {
    /// Numeric view; placeholder values ("None", "-", empty) stay absent
    pub fn to_metrics(&self) -> FundamentalMetrics {
        FundamentalMetrics {
            market_cap: parse_number(self.market_cap.as_deref()),
            pe_ratio: parse_number(self.pe_ratio.as_deref()),
            forward_pe: parse_number(self.forward_pe.as_deref()),
            price_to_book: parse_number(self.price_to_book_ratio.as_deref()),
            debt_to_equity: None,
            roe: parse_number(self.return_on_equity.as_deref()),
            roa: parse_number(self.return_on_assets.as_deref()),
            profit_margin: parse_number(self.profit_margin.as_deref()),
            revenue_growth: parse_number(self.revenue_growth.as_deref()),
            earnings_growth: parse_number(self.earnings_growth.as_deref()),
            dividend_yield: parse_number(self.dividend_yield.as_deref()),
            beta: parse_number(self.beta.as_deref()),
            week_52_high: parse_number(self.week_52_high.as_deref()),
            week_52_low: parse_number(self.week_52_low.as_deref()),
            avg_volume: None,
            sector: parse_text(self.sector.as_deref()),
            industry: parse_text(self.industry.as_deref()),
        }
    }
}

fn parse_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty() && *v != "None" && *v != "-")
        .map(ToString::to_string)
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    parse_text(raw)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Maximum requests per minute (free tier: 5)
    /// * `timeout` - HTTP timeout per request
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Get company overview and fundamental data
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn company_overview(&self, symbol: &Symbol) -> Result<CompanyOverview> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "OVERVIEW"),
                ("symbol", symbol.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MarketError::AlphaVantage(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: serde_json::Value = response.json().await?;
        let overview = parse_overview(symbol, data)?;
        debug!("overview received for {}", overview.symbol);
        Ok(overview)
    }
}

/// Interpret an `OVERVIEW` body, surfacing the API's in-band errors
fn parse_overview(symbol: &Symbol, data: serde_json::Value) -> Result<CompanyOverview> {
    if let Some(error) = data.get("Error Message") {
        return Err(MarketError::AlphaVantage(error.to_string()));
    }

    if data.get("Note").is_some() || data.get("Information").is_some() {
        return Err(MarketError::RateLimitExceeded {
            provider: "Alpha Vantage".to_string(),
        });
    }

    // Unknown symbols come back as an empty object
    if data.as_object().is_none_or(serde_json::Map::is_empty) {
        return Err(MarketError::InvalidSymbol(symbol.to_string()));
    }

    Ok(serde_json::from_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn aapl() -> Symbol {
        Symbol::parse("AAPL").unwrap()
    }

    #[test]
    fn test_overview_to_metrics() {
        let data = json!({
            "Symbol": "AAPL",
            "Name": "Apple Inc",
            "Sector": "TECHNOLOGY",
            "Industry": "ELECTRONIC COMPUTERS",
            "MarketCapitalization": "3400000000000",
            "PERatio": "33.5",
            "ForwardPE": "None",
            "PriceToBookRatio": "52.1",
            "ReturnOnEquityTTM": "1.56",
            "ProfitMargin": "0.24",
            "QuarterlyRevenueGrowthYOY": "0.061",
            "DividendYield": "0.0044",
            "Beta": "1.24",
            "52WeekHigh": "260.1",
            "52WeekLow": "-"
        });

        let overview = parse_overview(&aapl(), data).unwrap();
        assert_eq!(overview.name.as_deref(), Some("Apple Inc"));

        let metrics = overview.to_metrics();
        assert_eq!(metrics.pe_ratio, Some(33.5));
        assert_eq!(metrics.forward_pe, None);
        assert_eq!(metrics.price_to_book, Some(52.1));
        assert_eq!(metrics.roe, Some(1.56));
        assert_eq!(metrics.week_52_low, None);
        assert_eq!(metrics.debt_to_equity, None);
        assert_eq!(metrics.sector.as_deref(), Some("TECHNOLOGY"));
    }

    #[test]
    fn test_in_band_errors() {
        let err = parse_overview(&aapl(), json!({"Error Message": "Invalid API call"}));
        assert!(matches!(err, Err(MarketError::AlphaVantage(_))));

        let err = parse_overview(&aapl(), json!({"Note": "Thank you for using Alpha Vantage!"}));
        assert!(matches!(err, Err(MarketError::RateLimitExceeded { .. })));

        let err = parse_overview(&aapl(), json!({}));
        assert!(matches!(err, Err(MarketError::InvalidSymbol(_))));
    }

    #[test]
    fn test_parse_number_placeholders() {
        assert_eq!(parse_number(Some("None")), None);
        assert_eq!(parse_number(Some(" 12.5 ")), Some(12.5));
        assert_eq!(parse_number(Some("abc")), None);
        assert_eq!(parse_number(None), None);
    }

    #[tokio::test]
    #[ignore] // Requires network access and ALPHA_VANTAGE_API_KEY
    async fn test_company_overview_live() {
        let key = std::env::var("ALPHA_VANTAGE_API_KEY").unwrap();
        let client = AlphaVantageClient::new(key, 5, Duration::from_secs(30)).unwrap();
        let overview = client.company_overview(&aapl()).await.unwrap();
        assert_eq!(overview.symbol, "AAPL");
    }
}
