//! Report sections

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six kinds of section, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    ExecutiveSummary,
    MarketAnalysis,
    TechnicalAnalysis,
    FundamentalAnalysis,
    RiskAssessment,
    Recommendations,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::ExecutiveSummary,
        SectionKind::MarketAnalysis,
        SectionKind::TechnicalAnalysis,
        SectionKind::FundamentalAnalysis,
        SectionKind::RiskAssessment,
        SectionKind::Recommendations,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::ExecutiveSummary => "Executive Summary",
            SectionKind::MarketAnalysis => "Market Analysis",
            SectionKind::TechnicalAnalysis => "Technical Analysis",
            SectionKind::FundamentalAnalysis => "Fundamental Analysis",
            SectionKind::RiskAssessment => "Risk Assessment",
            SectionKind::Recommendations => "Investment Recommendations",
        }
    }

    /// Position in the compiled report, starting at 1
    pub fn order(&self) -> u32 {
        match self {
            SectionKind::ExecutiveSummary => 1,
            SectionKind::MarketAnalysis => 2,
            SectionKind::TechnicalAnalysis => 3,
            SectionKind::FundamentalAnalysis => 4,
            SectionKind::RiskAssessment => 5,
            SectionKind::Recommendations => 6,
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            SectionKind::ExecutiveSummary => {
                "You are a senior financial analyst writing for C-suite executives."
            }
            SectionKind::MarketAnalysis => {
                "You are a market strategist providing institutional-grade market analysis."
            }
            SectionKind::TechnicalAnalysis => {
                "You are a technical analyst providing detailed chart analysis."
            }
            SectionKind::FundamentalAnalysis => {
                "You are a fundamental analyst with deep expertise in financial statement analysis."
            }
            SectionKind::RiskAssessment => {
                "You are a risk management specialist providing comprehensive risk analysis."
            }
            SectionKind::Recommendations => {
                "You are a portfolio manager providing actionable investment recommendations."
            }
        }
    }

    /// Lower-case name used in progress messages
    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::ExecutiveSummary => "executive summary",
            SectionKind::MarketAnalysis => "market analysis",
            SectionKind::TechnicalAnalysis => "technical analysis",
            SectionKind::FundamentalAnalysis => "fundamental analysis",
            SectionKind::RiskAssessment => "risk assessment",
            SectionKind::Recommendations => "recommendations",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub content: String,
    pub order: u32,
    pub kind: SectionKind,
}

impl ReportSection {
    /// Section of `kind` with its standard title and order
    pub fn new(kind: SectionKind, content: impl Into<String>) -> Self {
        Self {
            title: kind.title().to_string(),
            content: content.into(),
            order: kind.order(),
            kind,
        }
    }
}
