//! Analysis engine for the equity analyst
//!
//! The per-symbol computations the pipeline stages delegate to:
//!
//! - [`indicators`]: moving averages, RSI, volatility, trend and volume signals
//! - [`fundamentals`]: threshold buckets over fundamental ratios
//! - [`narrative`]: LLM-backed sentiment, insights and recommendations with fixed fallbacks
//! - [`chart`]: the chart-rendering capability
//!
//! Indicator and fundamental functions are pure; the same input always yields
//! the same output.

pub mod chart;
pub mod fundamentals;
pub mod indicators;
pub mod narrative;
pub mod prompts;

pub use chart::{ChartRenderer, JsonChartRenderer};
pub use fundamentals::assess;
pub use indicators::summarize;
pub use narrative::{AnalysisView, Narrative, NarrativeSynthesizer, SentimentInput};
pub use prompts::PromptLibrary;
