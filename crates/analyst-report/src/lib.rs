//! Report writer for equity analysis runs
//!
//! [`ReportWriter`] turns a finished run's
//! [`AnalysisSummary`](analyst_core::AnalysisSummary) into up to six narrative
//! sections, one generation call each, and [`Report`] compiles them into a
//! plain-text document with a fixed header and disclaimer footer.

pub mod error;
pub mod report;
pub mod section;
pub mod writer;

pub use error::{ReportError, Result};
pub use report::{Report, ReportMetadata};
pub use section::{ReportSection, SectionKind};
pub use writer::{Audience, ReportType, ReportWriter};
