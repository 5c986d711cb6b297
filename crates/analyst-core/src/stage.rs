//! Pipeline stage identifiers and outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// States of the analysis pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DataCollection,
    TechnicalAnalysis,
    FundamentalAnalysis,
    SentimentAnalysis,
    GenerateInsights,
    CreateVisualizations,
    GenerateRecommendations,
    Done,
}

impl Stage {
    /// The working stages; `Done` is terminal and runs nothing
    pub const SEQUENCE: [Stage; 7] = [
        Stage::DataCollection,
        Stage::TechnicalAnalysis,
        Stage::FundamentalAnalysis,
        Stage::SentimentAnalysis,
        Stage::GenerateInsights,
        Stage::CreateVisualizations,
        Stage::GenerateRecommendations,
    ];

    /// Next state; `Done` stays `Done`
    pub fn next(self) -> Stage {
        match self {
            Stage::DataCollection => Stage::TechnicalAnalysis,
            Stage::TechnicalAnalysis => Stage::FundamentalAnalysis,
            Stage::FundamentalAnalysis => Stage::SentimentAnalysis,
            Stage::SentimentAnalysis => Stage::GenerateInsights,
            Stage::GenerateInsights => Stage::CreateVisualizations,
            Stage::CreateVisualizations => Stage::GenerateRecommendations,
            Stage::GenerateRecommendations | Stage::Done => Stage::Done,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::DataCollection => "data_collection",
            Stage::TechnicalAnalysis => "technical_analysis",
            Stage::FundamentalAnalysis => "fundamental_analysis",
            Stage::SentimentAnalysis => "sentiment_analysis",
            Stage::GenerateInsights => "generate_insights",
            Stage::CreateVisualizations => "create_visualizations",
            Stage::GenerateRecommendations => "generate_recommendations",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageResult {
    /// Every unit of work succeeded
    Completed,
    /// Some symbols (or the aggregate call) failed and were logged
    Partial { failed: usize },
    /// A precondition was missing, so the stage produced nothing
    Skipped { reason: String },
}

impl StageResult {
    /// `Completed` when nothing failed, `Partial` otherwise
    pub fn from_failures(failed: usize) -> Self {
        if failed == 0 {
            StageResult::Completed
        } else {
            StageResult::Partial { failed }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StageResult::Completed)
    }
}

/// Record of a finished stage kept on the context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub result: StageResult,
    pub duration_ms: u64,
}
