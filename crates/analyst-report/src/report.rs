//! Compiled report document

use crate::section::{ReportSection, SectionKind};
use crate::writer::{Audience, ReportType};
use crate::{ReportError, Result};
use analyst_core::{AnalysisSummary, AnalysisType, Period, Symbol};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

const RULE_WIDTH: usize = 80;
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const DISCLAIMERS: [&str; 4] = [
    "This report is for informational purposes only and does not constitute investment advice",
    "Past performance does not guarantee future results",
    "All investments carry risk of loss",
    "Consult with a qualified financial advisor before making investment decisions",
];

/// What the report covers and what data backed it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub created_at: DateTime<Local>,
    pub symbols: Vec<Symbol>,
    pub analysis_type: AnalysisType,
    pub data_period: Period,
    pub report_type: ReportType,
    pub audience: Audience,
    pub has_technical_data: bool,
    pub has_fundamental_data: bool,
    pub has_sentiment_data: bool,
    pub has_charts: bool,
}

impl ReportMetadata {
    pub fn from_summary(
        summary: &AnalysisSummary,
        report_type: ReportType,
        audience: Audience,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            created_at,
            symbols: summary.symbols_analyzed.clone(),
            analysis_type: summary.analysis_type,
            data_period: summary.period,
            report_type,
            audience,
            has_technical_data: !summary.technical_analysis.is_empty(),
            has_fundamental_data: !summary.fundamental_analysis.is_empty(),
            has_sentiment_data: !summary.sentiment_analysis.is_empty(),
            has_charts: !summary.chart_paths.is_empty(),
        }
    }

    pub fn created_date(&self) -> String {
        self.created_at.format(DATE_FORMAT).to_string()
    }

    pub fn symbol_list(&self) -> String {
        self.symbols
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn headline(&self) -> String {
        match self.symbols.as_slice() {
            [only] => only.to_string(),
            _ => format!("Multi-Stock Analysis: {}", self.symbol_list()),
        }
    }
}

/// Sections written for one run, plus what the footer needs
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    sections: Vec<ReportSection>,
    pub chart_paths: Vec<PathBuf>,
    pub messages: Vec<String>,
}

impl Report {
    pub fn new(metadata: ReportMetadata, chart_paths: Vec<PathBuf>) -> Self {
        Self {
            metadata,
            sections: Vec::new(),
            chart_paths,
            messages: Vec::new(),
        }
    }

    /// Add a section; each kind may appear once
    pub fn add_section(&mut self, section: ReportSection) -> Result<()> {
        if self.has_section(section.kind) {
            return Err(ReportError::DuplicateSection(section.kind));
        }
        self.sections.push(section);
        Ok(())
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.sections.iter().any(|s| s.kind == kind)
    }

    /// Sections sorted by order
    pub fn sections(&self) -> Vec<&ReportSection> {
        let mut sections: Vec<&ReportSection> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.order);
        sections
    }

    /// Render the plain-text report
    pub fn compile(&self) -> String {
        let meta = &self.metadata;
        let created = meta.created_date();
        let rule = "=".repeat(RULE_WIDTH);

        let header = format!(
            "\nFINANCIAL ANALYSIS REPORT\n{}\n\nReport Date: {created}\nAnalysis Period: {}\nAnalysis Type: {}\nSymbols Analyzed: {}\n\n{rule}\n",
            meta.headline(),
            meta.data_period,
            meta.analysis_type.title(),
            meta.symbol_list(),
        );

        let mut blocks = vec![header];
        for section in self.sections() {
            blocks.push(format!(
                "\n{}\n{}\n{}\n",
                section.title.to_uppercase(),
                "-".repeat(section.title.chars().count()),
                section.content
            ));
        }

        let charts = if self.chart_paths.is_empty() {
            "No charts generated".to_string()
        } else {
            self.chart_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut footer = format!("\n{rule}\n\nIMPORTANT DISCLAIMERS:\n");
        for line in DISCLAIMERS {
            let _ = writeln!(footer, "- {line}");
        }
        let _ = writeln!(
            footer,
            "- Data and analysis are based on information available as of {created}"
        );
        let _ = write!(
            footer,
            "\nReport generated by AI Financial Analysis System\nCharts available at: {charts}\n"
        );

        blocks.join("\n") + &footer
    }

    /// Default file name for a report saved at `at`
    pub fn file_name(&self, at: DateTime<Local>) -> String {
        let timestamp = at.format(FILE_TIMESTAMP_FORMAT);
        match self.metadata.symbols.as_slice() {
            [only] => format!("{only}_financial_report_{timestamp}.txt"),
            _ => format!("multi_stock_report_{timestamp}.txt"),
        }
    }

    /// Write the compiled report into `dir`, creating it if needed
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(self.file_name(Local::now()));
        tokio::fs::write(&path, self.compile()).await?;

        info!("Report saved to: {}", path.display());
        Ok(path)
    }
}
