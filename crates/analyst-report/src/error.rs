//! Error types for report writing

use crate::section::SectionKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// A compiled report holds each section kind once
    #[error("Section already present: {0}")]
    DuplicateSection(SectionKind),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid report type: {0}")]
    InvalidReportType(String),

    #[error("Invalid audience: {0}")]
    InvalidAudience(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
