//! Core domain model for the equity analyst workspace
//!
//! Everything the pipeline stages read and write lives here:
//!
//! - [`Symbol`] and the market data records ([`PriceSeries`], [`FundamentalMetrics`],
//!   [`NewsItem`], [`MarketSnapshot`])
//! - per-symbol derived records ([`TechnicalSummary`], [`FundamentalAssessment`],
//!   [`SentimentResult`])
//! - the run-scoped [`AnalysisContext`] and its stage bookkeeping
//! - the [`AnalysisError`] taxonomy

pub mod analysis;
pub mod context;
pub mod error;
pub mod market;
pub mod stage;
pub mod symbol;

pub use analysis::{
    FinancialHealth, FundamentalAssessment, GrowthAssessment, GrowthBucket, LeverageBucket,
    MarginBucket, Momentum, PbBucket, PeBucket, Profitability, RiskBucket, RoeBucket,
    SentimentResult, TechnicalSummary, TrendDirection, TrendSignal, Valuation, VolumeTrend,
};
pub use context::{AnalysisContext, AnalysisIssue, AnalysisSummary, AnalysisType};
pub use error::{AnalysisError, ErrorKind, Result};
pub use market::{
    FundamentalMetrics, Interval, MarketSnapshot, NewsItem, Period, PriceBar, PriceSeries,
};
pub use stage::{Stage, StageReport, StageResult};
pub use symbol::Symbol;
