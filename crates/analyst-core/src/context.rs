//! Run-scoped analysis context

use crate::{
    AnalysisError, ErrorKind, FundamentalAssessment, Interval, MarketSnapshot, Period, Result,
    SentimentResult, Stage, StageReport, Symbol, TechnicalSummary,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Flavor of analysis requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    Single,
    Comparison,
    Portfolio,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Single => "single",
            AnalysisType::Comparison => "comparison",
            AnalysisType::Portfolio => "portfolio",
        }
    }

    /// Capitalized form used in report headers
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisType::Single => "Single",
            AnalysisType::Comparison => "Comparison",
            AnalysisType::Portfolio => "Portfolio",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(AnalysisType::Single),
            "comparison" => Ok(AnalysisType::Comparison),
            "portfolio" => Ok(AnalysisType::Portfolio),
            _ => Err(AnalysisError::InvalidAnalysisType(s.to_string())),
        }
    }
}

/// One logged failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisIssue {
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for AnalysisIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Mutable state of one analysis run
///
/// Owned by the pipeline for the duration of a run. Per-symbol maps are keyed
/// by [`Symbol`] and only ever contain symbols present in `raw_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisContext {
    pub run_id: String,
    pub symbols: Vec<Symbol>,
    pub analysis_type: AnalysisType,
    pub period: Period,
    pub interval: Interval,
    pub raw_data: BTreeMap<Symbol, MarketSnapshot>,
    pub technical: BTreeMap<Symbol, TechnicalSummary>,
    pub fundamental: BTreeMap<Symbol, FundamentalAssessment>,
    pub sentiment: BTreeMap<Symbol, SentimentResult>,
    pub insights: Option<String>,
    pub recommendations: Vec<String>,
    pub chart_paths: Vec<PathBuf>,
    pub messages: Vec<String>,
    pub errors: Vec<AnalysisIssue>,
    pub stage_reports: Vec<StageReport>,
    pub current_stage: Stage,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AnalysisContext {
    /// Fresh context; fails when no symbols are given
    pub fn new(
        symbols: Vec<Symbol>,
        analysis_type: AnalysisType,
        period: Period,
        interval: Interval,
    ) -> Result<Self> {
        if symbols.is_empty() {
            return Err(AnalysisError::NoSymbols);
        }

        Ok(Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            symbols,
            analysis_type,
            period,
            interval,
            raw_data: BTreeMap::new(),
            technical: BTreeMap::new(),
            fundamental: BTreeMap::new(),
            sentiment: BTreeMap::new(),
            insights: None,
            recommendations: Vec::new(),
            chart_paths: Vec::new(),
            messages: Vec::new(),
            errors: Vec::new(),
            stage_reports: Vec::new(),
            current_stage: Stage::DataCollection,
            started_at: Utc::now(),
            finished_at: None,
        })
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Log a failure against the current stage
    pub fn push_error(
        &mut self,
        symbol: Option<&Symbol>,
        error: &AnalysisError,
        message: impl Into<String>,
    ) {
        self.errors.push(AnalysisIssue {
            stage: self.current_stage,
            symbol: symbol.cloned(),
            kind: error.kind(),
            message: message.into(),
        });
    }

    /// Symbols that survived data collection, in key order
    pub fn collected_symbols(&self) -> Vec<Symbol> {
        self.raw_data.keys().cloned().collect()
    }

    /// Number of logged failures attributed to `symbol`
    pub fn error_count_for(&self, symbol: &Symbol) -> usize {
        self.errors
            .iter()
            .filter(|issue| issue.symbol.as_ref() == Some(symbol))
            .count()
    }

    pub fn is_finished(&self) -> bool {
        self.current_stage == Stage::Done
    }

    /// Serializable view without the raw price history
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            run_id: self.run_id.clone(),
            symbols_analyzed: self.symbols.clone(),
            analysis_type: self.analysis_type,
            period: self.period,
            interval: self.interval,
            technical_analysis: self.technical.clone(),
            fundamental_analysis: self.fundamental.clone(),
            sentiment_analysis: self.sentiment.clone(),
            insights: self.insights.clone().unwrap_or_default(),
            recommendations: self.recommendations.clone(),
            chart_paths: self.chart_paths.clone(),
            messages: self.messages.clone(),
            errors: self.errors.iter().map(ToString::to_string).collect(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Flattened result of a run, suitable for JSON export and report writing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub run_id: String,
    pub symbols_analyzed: Vec<Symbol>,
    pub analysis_type: AnalysisType,
    pub period: Period,
    pub interval: Interval,
    pub technical_analysis: BTreeMap<Symbol, TechnicalSummary>,
    pub fundamental_analysis: BTreeMap<Symbol, FundamentalAssessment>,
    pub sentiment_analysis: BTreeMap<Symbol, SentimentResult>,
    pub insights: String,
    pub recommendations: Vec<String>,
    pub chart_paths: Vec<PathBuf>,
    pub messages: Vec<String>,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(raw: &[&str]) -> Vec<Symbol> {
        Symbol::parse_many(raw.iter().copied()).unwrap()
    }

    #[test]
    fn test_context_requires_symbols() {
        let result = AnalysisContext::new(
            Vec::new(),
            AnalysisType::Single,
            Period::OneYear,
            Interval::OneDay,
        );
        assert!(matches!(result, Err(AnalysisError::NoSymbols)));
    }

    #[test]
    fn test_new_context_is_empty() {
        let ctx = AnalysisContext::new(
            symbols(&["AAPL", "MSFT"]),
            AnalysisType::Comparison,
            Period::SixMonths,
            Interval::OneDay,
        )
        .unwrap();

        assert_eq!(ctx.symbols.len(), 2);
        assert!(ctx.raw_data.is_empty());
        assert!(ctx.messages.is_empty());
        assert_eq!(ctx.current_stage, Stage::DataCollection);
        assert!(!ctx.run_id.is_empty());
    }

    #[test]
    fn test_error_attribution() {
        let mut ctx = AnalysisContext::new(
            symbols(&["AAPL", "MSFT"]),
            AnalysisType::Comparison,
            Period::OneYear,
            Interval::OneDay,
        )
        .unwrap();
        let msft = Symbol::parse("MSFT").unwrap();
        let err = AnalysisError::data_unavailable("MSFT", "timeout");

        ctx.push_error(Some(&msft), &err, format!("Failed to collect data for MSFT: {err}"));
        ctx.push_error(None, &AnalysisError::Generation("x".into()), "insights failed");

        assert_eq!(ctx.error_count_for(&msft), 1);
        assert_eq!(ctx.errors[0].kind, ErrorKind::DataUnavailable);
        assert_eq!(ctx.errors[0].stage, Stage::DataCollection);
        assert_eq!(
            ctx.errors[0].to_string(),
            "Failed to collect data for MSFT: Data not available for MSFT: timeout"
        );
    }

    #[test]
    fn test_summary_serializes_symbol_keys() {
        let ctx = AnalysisContext::new(
            symbols(&["AAPL"]),
            AnalysisType::Single,
            Period::OneYear,
            Interval::OneDay,
        )
        .unwrap();
        let json = serde_json::to_value(ctx.summary()).unwrap();
        assert_eq!(json["symbols_analyzed"][0], "AAPL");
        assert_eq!(json["period"], "1y");
        assert_eq!(json["analysis_type"], "single");
        assert_eq!(json["insights"], "");
    }

    #[test]
    fn test_analysis_type_parse() {
        assert_eq!(
            "Portfolio".parse::<AnalysisType>().unwrap(),
            AnalysisType::Portfolio
        );
        assert!("hedge".parse::<AnalysisType>().is_err());
        assert_eq!(AnalysisType::Comparison.title(), "Comparison");
    }
}
