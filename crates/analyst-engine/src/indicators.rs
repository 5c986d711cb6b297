//! Technical indicators over a price series
//!
//! [`summarize`] is the entry point; the helpers are public so callers and tests
//! can compute a single indicator in isolation. All functions are pure.

use analyst_core::{
    AnalysisError, Momentum, PriceSeries, Result, Symbol, TechnicalSummary, TrendDirection,
    TrendSignal, VolumeTrend,
};
use ta::Next;
use ta::indicators::SimpleMovingAverage;

/// Lookback of the relative strength index
pub const RSI_PERIOD: usize = 14;

/// Trading days used to annualize daily volatility
pub const TRADING_DAYS: f64 = 252.0;

const RECENT_VOLUME_WINDOW: usize = 5;
const MIN_VOLUME_OBSERVATIONS: usize = 10;

/// Indicator snapshot for `series`, or `None` when the series is empty
///
/// Fails with [`AnalysisError::Computation`] when a close is not finite or a
/// reference price used as a divisor is zero.
pub fn summarize(symbol: &Symbol, series: &PriceSeries) -> Result<Option<TechnicalSummary>> {
    let closes = series.closes();
    let Some(&current_price) = closes.last() else {
        return Ok(None);
    };

    if let Some(bad) = closes.iter().position(|c| !c.is_finite()) {
        return Err(AnalysisError::computation(
            symbol.as_str(),
            format!("non-finite close at observation {bad}"),
        ));
    }

    let ma_20 = sma_last(&closes, 20);
    let ma_50 = sma_last(&closes, 50);
    let rsi = rsi(&closes, RSI_PERIOD);

    let mut summary = TechnicalSummary {
        current_price,
        observations: closes.len(),
        ma_20,
        ma_50,
        rsi,
        price_change_1d: price_change(symbol, &closes, 1, 1)?,
        price_change_1w: price_change(symbol, &closes, 6, 7)?,
        price_change_1m: price_change(symbol, &closes, 29, 30)?,
        volatility: annualized_volatility(symbol, &closes)?,
        trend_signal: trend_signal(current_price, ma_20, ma_50, rsi),
        volume_trend: volume_trend(&series.volumes()),
        signals: Vec::new(),
    };
    summary.signals = describe_signals(&summary);

    Ok(Some(summary))
}

/// Mean of the last `period` closes, `None` until that many exist
pub fn sma_last(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let mut sma = SimpleMovingAverage::new(period).ok()?;
    closes[closes.len() - period..]
        .iter()
        .fold(None, |_, &close| Some(sma.next(close)))
}

/// RSI from simple means of the last `period` gains and losses
///
/// Needs `period + 1` closes. Undefined when there were no losses in the window.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() <= period {
        return None;
    }

    let window = &closes[closes.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(g, l), delta| {
            if delta > 0.0 {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        return None;
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Percent change against the close `offset` bars back
///
/// Only computed when the series is strictly longer than `min_len`.
pub fn price_change(
    symbol: &Symbol,
    closes: &[f64],
    offset: usize,
    min_len: usize,
) -> Result<Option<f64>> {
    if closes.len() <= min_len || closes.len() <= offset {
        return Ok(None);
    }

    let current = closes[closes.len() - 1];
    let past = closes[closes.len() - 1 - offset];
    if past == 0.0 {
        return Err(AnalysisError::computation(
            symbol.as_str(),
            format!("zero reference price {offset} bars back"),
        ));
    }

    Ok(Some((current - past) / past * 100.0))
}

/// Sample standard deviation of daily percent returns, annualized, in percent
pub fn annualized_volatility(symbol: &Symbol, closes: &[f64]) -> Result<Option<f64>> {
    let returns = closes
        .windows(2)
        .map(|pair| {
            if pair[0] == 0.0 {
                Err(AnalysisError::computation(
                    symbol.as_str(),
                    "zero close in return series",
                ))
            } else {
                Ok((pair[1] - pair[0]) / pair[0])
            }
        })
        .collect::<Result<Vec<f64>>>()?;

    if returns.len() < 2 {
        return Ok(None);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);

    Ok(Some(variance.sqrt() * TRADING_DAYS.sqrt() * 100.0))
}

/// Moving-average alignment plus RSI extremes
pub fn trend_signal(
    price: f64,
    ma_20: Option<f64>,
    ma_50: Option<f64>,
    rsi: Option<f64>,
) -> TrendSignal {
    let direction = match (ma_20, ma_50) {
        (Some(ma20), Some(ma50)) if price > ma20 && ma20 > ma50 => Some(TrendDirection::Bullish),
        (Some(ma20), Some(ma50)) if price < ma20 && ma20 < ma50 => Some(TrendDirection::Bearish),
        (Some(_), Some(_)) => Some(TrendDirection::Neutral),
        _ => None,
    };

    let momentum = match rsi {
        Some(r) if r > 70.0 => Some(Momentum::Overbought),
        Some(r) if r < 30.0 => Some(Momentum::Oversold),
        _ => None,
    };

    TrendSignal {
        direction,
        momentum,
    }
}

/// Mean of the last five volumes against the mean of everything before them
pub fn volume_trend(volumes: &[f64]) -> VolumeTrend {
    if volumes.len() < MIN_VOLUME_OBSERVATIONS {
        return VolumeTrend::InsufficientData;
    }

    let split = volumes.len() - RECENT_VOLUME_WINDOW;
    let recent = mean(&volumes[split..]);
    let historical = mean(&volumes[..split]);
    classify_volume(recent, historical)
}

/// Classification behind [`volume_trend`] given the two means
pub fn classify_volume(recent: f64, historical: f64) -> VolumeTrend {
    if historical == 0.0 {
        return if recent > 0.0 {
            VolumeTrend::Increasing
        } else {
            VolumeTrend::Stable
        };
    }

    let ratio = recent / historical;
    if ratio >= 1.2 {
        VolumeTrend::Increasing
    } else if ratio <= 0.8 {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Stable
    }
}

/// Human-readable signals for a computed summary
pub fn describe_signals(summary: &TechnicalSummary) -> Vec<String> {
    let mut signals = Vec::new();

    if let Some(rsi) = summary.rsi {
        signals.push(
            if rsi > 70.0 {
                "RSI indicates overbought conditions"
            } else if rsi < 30.0 {
                "RSI indicates oversold conditions"
            } else {
                "RSI in neutral territory"
            }
            .to_string(),
        );
    }

    match summary.trend_signal.direction {
        Some(TrendDirection::Bullish) => {
            signals.push("Bullish trend - price above moving averages".to_string());
        }
        Some(TrendDirection::Bearish) => {
            signals.push("Bearish trend - price below moving averages".to_string());
        }
        _ => {}
    }

    match summary.volatility {
        Some(v) if v > 30.0 => signals.push("High volatility detected".to_string()),
        Some(v) if v < 15.0 => signals.push("Low volatility environment".to_string()),
        _ => {}
    }

    signals
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_core::PriceBar;
    use chrono::{Duration, TimeZone, Utc};

    fn symbol() -> Symbol {
        Symbol::parse("TEST").unwrap()
    }

    fn series(closes: &[f64], volumes: &[u64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: volumes.get(i).copied().unwrap_or(1_000),
            })
            .collect();
        PriceSeries::new(bars)
    }

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64) * 0.3 + if i % 3 == 0 { -1.5 } else { 0.8 })
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_series_yields_nothing() {
        let result = summarize(&symbol(), &PriceSeries::empty()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_ma_50_is_mean_of_last_50() {
        let closes = zigzag(80);
        let summary = summarize(&symbol(), &series(&closes, &[])).unwrap().unwrap();

        let expected = closes[30..].iter().sum::<f64>() / 50.0;
        assert!(approx(summary.ma_50.unwrap(), expected));

        let expected_20 = closes[60..].iter().sum::<f64>() / 20.0;
        assert!(approx(summary.ma_20.unwrap(), expected_20));
    }

    #[test]
    fn test_moving_averages_absent_on_short_history() {
        let closes = zigzag(30);
        let summary = summarize(&symbol(), &series(&closes, &[])).unwrap().unwrap();
        assert!(summary.ma_20.is_some());
        assert!(summary.ma_50.is_none());
        assert!(summary.trend_signal.direction.is_none());
    }

    #[test]
    fn test_rsi_bounds_and_minimum_history() {
        assert!(rsi(&zigzag(14), RSI_PERIOD).is_none());

        for n in [15, 40, 120] {
            let value = rsi(&zigzag(n), RSI_PERIOD).unwrap();
            assert!((0.0..=100.0).contains(&value), "rsi {value} out of range");
        }

        let falling: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert!(approx(rsi(&falling, RSI_PERIOD).unwrap(), 0.0));
    }

    #[test]
    fn test_rsi_undefined_without_losses() {
        let rising: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert!(rsi(&rising, RSI_PERIOD).is_none());
    }

    #[test]
    fn test_rsi_known_value() {
        // 7 gains of 2 and 7 losses of 1 -> rs = 2 -> 66.67
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = closes[closes.len() - 1];
            closes.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let value = rsi(&closes, RSI_PERIOD).unwrap();
        assert!((value - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_changes_absent_on_short_history() {
        let closes = [100.0, 110.0];
        let summary = summarize(&symbol(), &series(&closes, &[])).unwrap().unwrap();
        assert!(approx(summary.price_change_1d.unwrap(), 10.0));
        assert!(summary.price_change_1w.is_none());
        assert!(summary.price_change_1m.is_none());

        let single = summarize(&symbol(), &series(&[100.0], &[])).unwrap().unwrap();
        assert!(single.price_change_1d.is_none());
        assert!(single.volatility.is_none());
    }

    #[test]
    fn test_weekly_change_uses_six_bar_offset() {
        let closes: Vec<f64> = (1..=8).map(f64::from).collect();
        let change = price_change(&symbol(), &closes, 6, 7).unwrap().unwrap();
        assert!(approx(change, (8.0 - 2.0) / 2.0 * 100.0));
    }

    #[test]
    fn test_zero_reference_price_is_computation_error() {
        let err = price_change(&symbol(), &[0.0, 5.0], 1, 1).unwrap_err();
        assert!(matches!(err, AnalysisError::Computation { .. }));
    }

    #[test]
    fn test_non_finite_close_is_computation_error() {
        let closes = [100.0, f64::NAN, 101.0];
        let err = summarize(&symbol(), &series(&closes, &[])).unwrap_err();
        assert!(matches!(err, AnalysisError::Computation { .. }));
    }

    #[test]
    fn test_volatility_of_constant_returns_is_zero() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let vol = annualized_volatility(&symbol(), &closes).unwrap().unwrap();
        assert!(vol.abs() < 1e-6);
    }

    #[test]
    fn test_volatility_sample_std() {
        // returns: +10%, -10% -> mean 0, sample std = sqrt(0.02)
        let closes = [100.0, 110.0, 99.0];
        let vol = annualized_volatility(&symbol(), &closes).unwrap().unwrap();
        let expected = 0.02_f64.sqrt() * 252.0_f64.sqrt() * 100.0;
        assert!((vol - expected).abs() < 1e-9);
    }

    #[test]
    fn test_trend_signal_examples() {
        let bullish = trend_signal(110.0, Some(105.0), Some(100.0), Some(50.0));
        assert_eq!(bullish.label(), "bullish");

        let bearish = trend_signal(90.0, Some(95.0), Some(100.0), Some(50.0));
        assert_eq!(bearish.label(), "bearish");

        let hot = trend_signal(100.0, None, None, Some(75.0));
        assert!(hot.contains("overbought"));
        assert_eq!(hot.label(), "overbought");

        let mixed = trend_signal(100.0, Some(105.0), Some(100.0), Some(25.0));
        assert_eq!(mixed.label(), "neutral, oversold");

        assert_eq!(trend_signal(100.0, None, None, None).label(), "neutral");
    }

    #[test]
    fn test_volume_classification_examples() {
        assert_eq!(classify_volume(150.0, 100.0), VolumeTrend::Increasing);
        assert_eq!(classify_volume(80.0, 100.0), VolumeTrend::Decreasing);
        assert_eq!(classify_volume(95.0, 100.0), VolumeTrend::Stable);
        assert_eq!(classify_volume(0.0, 0.0), VolumeTrend::Stable);
    }

    #[test]
    fn test_volume_trend_windows() {
        assert_eq!(volume_trend(&[100.0; 9]), VolumeTrend::InsufficientData);

        let mut volumes = vec![100.0; 10];
        volumes[5..].fill(150.0);
        assert_eq!(volume_trend(&volumes), VolumeTrend::Increasing);
    }

    #[test]
    fn test_signals_text() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + f64::from(i) * 2.0 - if i % 5 == 0 { 3.0 } else { 0.0 })
            .collect();
        let summary = summarize(&symbol(), &series(&closes, &[])).unwrap().unwrap();

        assert!(summary.trend_signal.contains("bullish"));
        assert!(
            summary
                .signals
                .contains(&"Bullish trend - price above moving averages".to_string())
        );
        assert_eq!(summary.observations, 60);
    }

    #[test]
    fn test_summarize_is_deterministic() {
        let closes = zigzag(120);
        let volumes: Vec<u64> = (0..120).map(|i| 1_000 + i * 10).collect();
        let a = summarize(&symbol(), &series(&closes, &volumes)).unwrap();
        let b = summarize(&symbol(), &series(&closes, &volumes)).unwrap();
        assert_eq!(a, b);
    }
}
