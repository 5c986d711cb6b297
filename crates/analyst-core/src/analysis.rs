//! Per-symbol records derived by the analysis stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Indicator snapshot for one symbol
///
/// Numeric fields are `None` when the series is too short for the lookback
/// window they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSummary {
    pub current_price: f64,
    pub observations: usize,
    pub ma_20: Option<f64>,
    pub ma_50: Option<f64>,
    pub rsi: Option<f64>,
    pub price_change_1d: Option<f64>,
    pub price_change_1w: Option<f64>,
    pub price_change_1m: Option<f64>,
    pub volatility: Option<f64>,
    pub trend_signal: TrendSignal,
    pub volume_trend: VolumeTrend,
    pub signals: Vec<String>,
}

/// Moving-average alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Neutral,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Bullish => "bullish",
            TrendDirection::Bearish => "bearish",
            TrendDirection::Neutral => "neutral",
        }
    }
}

/// RSI extreme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Momentum {
    Overbought,
    Oversold,
}

impl Momentum {
    pub fn as_str(&self) -> &'static str {
        match self {
            Momentum::Overbought => "overbought",
            Momentum::Oversold => "oversold",
        }
    }
}

/// Combined trend label such as `"bullish, overbought"`
///
/// `direction` is only set when both moving averages exist. The rendered label
/// is `"neutral"` when neither part is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TrendSignal {
    pub direction: Option<TrendDirection>,
    pub momentum: Option<Momentum>,
}

impl TrendSignal {
    pub fn label(&self) -> String {
        let parts: Vec<&str> = self
            .direction
            .map(|d| d.as_str())
            .into_iter()
            .chain(self.momentum.map(|m| m.as_str()))
            .collect();

        if parts.is_empty() {
            "neutral".to_string()
        } else {
            parts.join(", ")
        }
    }

    pub fn contains(&self, part: &str) -> bool {
        self.label().split(", ").any(|p| p == part)
    }
}

impl fmt::Display for TrendSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<TrendSignal> for String {
    fn from(signal: TrendSignal) -> Self {
        signal.label()
    }
}

impl TryFrom<String> for TrendSignal {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        let mut signal = TrendSignal::default();
        let parts: Vec<&str> = label.split(',').map(str::trim).collect();
        let lone_neutral = parts == ["neutral"];

        for part in parts {
            match part {
                "bullish" => signal.direction = Some(TrendDirection::Bullish),
                "bearish" => signal.direction = Some(TrendDirection::Bearish),
                "neutral" if !lone_neutral => signal.direction = Some(TrendDirection::Neutral),
                "neutral" => {}
                "overbought" => signal.momentum = Some(Momentum::Overbought),
                "oversold" => signal.momentum = Some(Momentum::Oversold),
                other => return Err(format!("unknown trend signal component '{other}'")),
            }
        }
        Ok(signal)
    }
}

/// Recent volume relative to the earlier part of the series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

impl fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VolumeTrend::Increasing => "increasing",
            VolumeTrend::Decreasing => "decreasing",
            VolumeTrend::Stable => "stable",
            VolumeTrend::InsufficientData => "insufficient_data",
        })
    }
}

macro_rules! labelled_bucket {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labelled_bucket!(
    /// Price-to-earnings judgment
    PeBucket {
        Undervalued => "Potentially undervalued (low P/E)",
        Reasonable => "Reasonable valuation",
        Overvalued => "Potentially overvalued (high P/E)",
    }
);

labelled_bucket!(
    /// Price-to-book judgment; the 1-3 band carries no label
    PbBucket {
        BelowBook => "Trading below book value",
        Premium => "Trading at premium to book value",
    }
);

labelled_bucket!(
    MarginBucket {
        Strong => "Strong profitability",
        Good => "Good profitability",
        Low => "Low profitability",
    }
);

labelled_bucket!(
    RoeBucket {
        Strong => "Strong return on equity",
        Decent => "Decent return on equity",
        Low => "Low return on equity",
    }
);

labelled_bucket!(
    GrowthBucket {
        Strong => "Strong revenue growth",
        Moderate => "Moderate revenue growth",
        Slow => "Slow revenue growth",
    }
);

labelled_bucket!(
    LeverageBucket {
        Conservative => "Conservative debt levels",
        Moderate => "Moderate debt levels",
        High => "High debt levels",
    }
);

labelled_bucket!(
    /// Beta judgment
    RiskBucket {
        HighVolatility => "High volatility vs market",
        LowVolatility => "Low volatility vs market",
        Moderate => "Moderate volatility vs market",
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Valuation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_assessment: Option<PeBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_to_book: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pb_assessment: Option<PbBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profitability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_margin_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_assessment: Option<MarginBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roe_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roe_assessment: Option<RoeBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthAssessment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_growth_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_assessment: Option<GrowthBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earnings_growth_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialHealth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_to_equity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverage_assessment: Option<LeverageBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<RiskBucket>,
}

/// Qualitative reading of a symbol's fundamentals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalAssessment {
    pub valuation: Valuation,
    pub profitability: Profitability,
    pub growth: GrowthAssessment,
    pub financial_health: FinancialHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

/// Model-written sentiment for one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment_text: String,
    pub news_item_count: usize,
    /// Set when the text is the fixed fallback rather than model output
    #[serde(default)]
    pub fallback: bool,
}
