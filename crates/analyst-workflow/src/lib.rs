//! Staged analysis pipeline
//!
//! [`AnalysisPipeline`] drives one [`AnalysisContext`](analyst_core::AnalysisContext)
//! through a fixed, linear sequence of stages:
//!
//! ```text
//! DataCollection -> TechnicalAnalysis -> FundamentalAnalysis -> SentimentAnalysis
//!     -> GenerateInsights -> CreateVisualizations -> GenerateRecommendations -> Done
//! ```
//!
//! A stage never aborts the run. Per-symbol failures are logged on the context
//! and the symbol is left out of that stage's output; a symbol whose data
//! collection failed is left out of every later stage.

pub mod config;
pub mod pipeline;
pub mod stages;

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use pipeline::{AnalysisPipeline, PipelineBuilder, PipelineOutcome};
pub use stages::{
    DataCollectionStage, FundamentalStage, InsightsStage, PipelineStage, RecommendationsStage,
    SentimentStage, TechnicalStage, VisualizationStage,
};
