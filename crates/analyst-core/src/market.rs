//! Market data records produced by the data-collection capability

use crate::{AnalysisError, Symbol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lookback window for price history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    pub const ALL: [Period; 11] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
        Period::YearToDate,
        Period::Max,
    ];

    /// Wire string understood by the quote provider
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| AnalysisError::InvalidPeriod(s.to_string()))
    }
}

/// Bar size for price history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "2m")]
    TwoMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "60m")]
    SixtyMinutes,
    #[serde(rename = "90m")]
    NinetyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
}

impl Interval {
    pub const ALL: [Interval; 13] = [
        Interval::OneMinute,
        Interval::TwoMinutes,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::SixtyMinutes,
        Interval::NinetyMinutes,
        Interval::OneHour,
        Interval::OneDay,
        Interval::FiveDays,
        Interval::OneWeek,
        Interval::OneMonth,
        Interval::ThreeMonths,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::TwoMinutes => "2m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::SixtyMinutes => "60m",
            Interval::NinetyMinutes => "90m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::FiveDays => "5d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
            Interval::ThreeMonths => "3mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == needle)
            .ok_or_else(|| AnalysisError::InvalidInterval(s.to_string()))
    }
}

/// One OHLCV observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Price history ordered by ascending timestamp with no duplicate timestamps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PriceBar>", into = "Vec<PriceBar>")]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from bars in any order
    ///
    /// Bars are sorted by timestamp; when two bars share a timestamp the one
    /// appearing later in the input wins.
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);

        let mut ordered: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match ordered.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => ordered.push(bar),
            }
        }

        Self { bars: ordered }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }
}

impl From<Vec<PriceBar>> for PriceSeries {
    fn from(bars: Vec<PriceBar>) -> Self {
        Self::new(bars)
    }
}

impl From<PriceSeries> for Vec<PriceBar> {
    fn from(series: PriceSeries) -> Self {
        series.bars
    }
}

/// Company fundamentals as reported by the data source
///
/// Every field is optional; a metric the source did not report stays `None`
/// and is left out of the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_pe: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_to_book: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_to_equity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roe: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_growth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earnings_growth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(rename = "52w_high", skip_serializing_if = "Option::is_none")]
    pub week_52_high: Option<f64>,
    #[serde(rename = "52w_low", skip_serializing_if = "Option::is_none")]
    pub week_52_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

impl FundamentalMetrics {
    /// True when the source reported nothing at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A news headline attached to a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl NewsItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            publisher: None,
            url: None,
            published_at: None,
        }
    }
}

/// Everything the data-collection capability returns for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: Symbol,
    pub company_name: String,
    pub current_price: Option<f64>,
    pub series: PriceSeries,
    pub fundamentals: FundamentalMetrics,
    pub news: Vec<NewsItem>,
}

impl MarketSnapshot {
    /// Snapshot with the company name defaulted to the ticker and the current
    /// price taken from the last close
    pub fn new(symbol: Symbol, series: PriceSeries) -> Self {
        let current_price = series.last().map(|b| b.close);
        Self {
            company_name: symbol.to_string(),
            symbol,
            current_price,
            series,
            fundamentals: FundamentalMetrics::default(),
            news: Vec::new(),
        }
    }

    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = name.into();
        self
    }

    pub fn with_fundamentals(mut self, fundamentals: FundamentalMetrics) -> Self {
        self.fundamentals = fundamentals;
        self
    }

    pub fn with_news(mut self, news: Vec<NewsItem>) -> Self {
        self.news = news;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_period_round_trip_strings() {
        for period in Period::ALL {
            assert_eq!(period.as_str().parse::<Period>().unwrap(), period);
        }
        assert_eq!("6MO".parse::<Period>().unwrap(), Period::SixMonths);
        assert!("7y".parse::<Period>().is_err());
    }

    #[test]
    fn test_interval_parse() {
        assert_eq!("1wk".parse::<Interval>().unwrap(), Interval::OneWeek);
        assert!("2h".parse::<Interval>().is_err());
    }

    #[test]
    fn test_series_sorted_and_deduplicated() {
        let series = PriceSeries::new(vec![bar(3, 3.0), bar(1, 1.0), bar(2, 2.0), bar(3, 30.0)]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.0, 2.0, 30.0]);
        assert!(
            series
                .bars()
                .windows(2)
                .all(|w| w[0].timestamp < w[1].timestamp)
        );
    }

    #[test]
    fn test_series_deserialize_normalizes() {
        let raw = serde_json::to_string(&vec![bar(2, 2.0), bar(1, 1.0)]).unwrap();
        let series: PriceSeries = serde_json::from_str(&raw).unwrap();
        assert_eq!(series.closes(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_absent_metrics_are_omitted() {
        let metrics = FundamentalMetrics {
            pe_ratio: Some(12.5),
            week_52_high: Some(199.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["pe_ratio"], 12.5);
        assert_eq!(json["52w_high"], 199.0);
        assert!(json.get("beta").is_none());
        assert!(!metrics.is_empty());
        assert!(FundamentalMetrics::default().is_empty());
    }

    #[test]
    fn test_snapshot_defaults() {
        let symbol = Symbol::parse("AAPL").unwrap();
        let snapshot = MarketSnapshot::new(symbol, PriceSeries::new(vec![bar(1, 10.0), bar(2, 11.0)]));
        assert_eq!(snapshot.company_name, "AAPL");
        assert_eq!(snapshot.current_price, Some(11.0));

        let empty = MarketSnapshot::new(Symbol::parse("MSFT").unwrap(), PriceSeries::empty());
        assert_eq!(empty.current_price, None);
    }
}
