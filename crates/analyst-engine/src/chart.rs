//! Chart-rendering capability

use analyst_core::{AnalysisError, PriceSeries, Result, Symbol, TechnicalSummary};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use ta::Next;
use ta::indicators::SimpleMovingAverage;
use tracing::{debug, instrument};

/// Renders a price chart for one symbol and returns where it was written
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(
        &self,
        symbol: &Symbol,
        series: &PriceSeries,
        technical: Option<&TechnicalSummary>,
    ) -> Result<PathBuf>;
}

/// Writes chart data as `{SYMBOL}_chart.json` for a front end to draw
#[derive(Debug, Clone)]
pub struct JsonChartRenderer {
    output_dir: PathBuf,
}

impl JsonChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl ChartRenderer for JsonChartRenderer {
    #[instrument(skip(self, series, technical), fields(symbol = %symbol))]
    async fn render(
        &self,
        symbol: &Symbol,
        series: &PriceSeries,
        technical: Option<&TechnicalSummary>,
    ) -> Result<PathBuf> {
        if series.is_empty() {
            return Err(AnalysisError::render(symbol.as_str(), "no price data"));
        }

        let chart = chart_data(symbol, series, technical);
        let body = serde_json::to_vec_pretty(&chart)?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AnalysisError::render(symbol.as_str(), e.to_string()))?;

        let path = self.output_dir.join(format!("{symbol}_chart.json"));
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| AnalysisError::render(symbol.as_str(), e.to_string()))?;

        debug!(path = %path.display(), "chart written");
        Ok(path)
    }
}

fn chart_data(symbol: &Symbol, series: &PriceSeries, technical: Option<&TechnicalSummary>) -> Value {
    let bars = series.bars();
    let timestamps: Vec<String> = bars.iter().map(|b| b.timestamp.to_rfc3339()).collect();

    let candlestick: Vec<Value> = bars
        .iter()
        .zip(&timestamps)
        .map(|(b, ts)| {
            json!({
                "timestamp": ts,
                "open": b.open,
                "high": b.high,
                "low": b.low,
                "close": b.close,
            })
        })
        .collect();

    let line: Vec<Value> = bars
        .iter()
        .zip(&timestamps)
        .map(|(b, ts)| json!({ "timestamp": ts, "value": b.close }))
        .collect();

    let volume: Vec<Value> = bars
        .iter()
        .zip(&timestamps)
        .map(|(b, ts)| json!({ "timestamp": ts, "value": b.volume }))
        .collect();

    let closes = series.closes();
    let mut overlays = json!({});
    for period in [20, 50] {
        if let Some(points) = sma_overlay(&closes, &timestamps, period) {
            overlays[format!("ma_{period}")] = Value::Array(points);
        }
    }

    json!({
        "symbol": symbol,
        "data_points": bars.len(),
        "candlestick": candlestick,
        "line": line,
        "volume": volume,
        "indicators": overlays,
        "metadata": {
            "start_date": timestamps.first(),
            "end_date": timestamps.last(),
            "min_price": bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
            "max_price": bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
            "technical": technical,
        },
    })
}

/// SMA points starting at the first full window; `None` if the series is shorter
fn sma_overlay(closes: &[f64], timestamps: &[String], period: usize) -> Option<Vec<Value>> {
    if closes.len() < period {
        return None;
    }

    let mut sma = SimpleMovingAverage::new(period).ok()?;
    let points = closes
        .iter()
        .zip(timestamps)
        .enumerate()
        .filter_map(|(i, (&close, ts))| {
            let value = sma.next(close);
            (i + 1 >= period).then(|| json!({ "timestamp": ts, "value": value }))
        })
        .collect();

    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_core::PriceBar;
    use chrono::{Duration, TimeZone, Utc};

    fn series(n: usize) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        PriceSeries::new(
            (0..n)
                .map(|i| PriceBar {
                    timestamp: start + Duration::days(i as i64),
                    open: 10.0,
                    high: 12.0 + i as f64,
                    low: 9.0,
                    close: 10.0 + i as f64,
                    volume: 500,
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_render_writes_chart_file() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = JsonChartRenderer::new(dir.path().join("charts"));
        let symbol = Symbol::parse("NVDA").unwrap();

        let path = renderer.render(&symbol, &series(25), None).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "NVDA_chart.json");

        let written: Value =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(written["symbol"], "NVDA");
        assert_eq!(written["data_points"], 25);
        assert_eq!(written["candlestick"].as_array().unwrap().len(), 25);
        // MA20 only once the window is full, no MA50 at all
        assert_eq!(written["indicators"]["ma_20"].as_array().unwrap().len(), 6);
        assert!(written["indicators"].get("ma_50").is_none());
        assert_eq!(written["metadata"]["min_price"], 9.0);
    }

    #[tokio::test]
    async fn test_empty_series_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = JsonChartRenderer::new(dir.path());
        let symbol = Symbol::parse("NVDA").unwrap();

        let err = renderer
            .render(&symbol, &PriceSeries::empty(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Render { .. }));
    }

    #[test]
    fn test_sma_overlay_values() {
        let closes: Vec<f64> = (1..=4).map(f64::from).collect();
        let ts: Vec<String> = (0..4).map(|i| i.to_string()).collect();
        let points = sma_overlay(&closes, &ts, 2).unwrap();
        let values: Vec<f64> = points.iter().map(|p| p["value"].as_f64().unwrap()).collect();
        assert_eq!(values, vec![1.5, 2.5, 3.5]);
    }
}
