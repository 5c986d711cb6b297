//! Files and console output for finished runs

use crate::app::RunOutput;
use analyst_core::{AnalysisSummary, Symbol};
use chrono::{DateTime, Local};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use std::path::{Path, PathBuf};
use tracing::info;

/// `{SYM}_analysis_{ts}.json` for one symbol, `multi_stock_analysis_{ts}.json` otherwise
pub fn analysis_file_name(symbols: &[Symbol], at: DateTime<Local>) -> String {
    let timestamp = at.format("%Y%m%d_%H%M%S");
    match symbols {
        [only] => format!("{only}_analysis_{timestamp}.json"),
        _ => format!("multi_stock_analysis_{timestamp}.json"),
    }
}

/// Write the summary as pretty JSON into `dir`
pub async fn save_analysis(dir: &Path, summary: &AnalysisSummary) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(analysis_file_name(&summary.symbols_analyzed, Local::now()));
    let json = serde_json::to_string_pretty(summary)?;
    tokio::fs::write(&path, json).await?;
    info!("Analysis results saved to: {}", path.display());
    Ok(path)
}

fn status(output: &RunOutput) -> String {
    match (output.cancelled_at, output.summary.errors.len()) {
        (Some(stage), _) => format!("Cancelled before {stage}"),
        (None, 0) => "Completed".to_string(),
        (None, n) => format!("Completed with {n} error(s)"),
    }
}

fn display_path(path: Option<&PathBuf>, fallback: &str) -> String {
    path.map_or_else(|| fallback.to_string(), |p| p.display().to_string())
}

/// Two-column overview of a run
pub fn summary_table(output: &RunOutput) -> Table {
    let summary = &output.summary;
    let symbols = summary
        .symbols_analyzed
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let charts = if summary.chart_paths.is_empty() {
        "None".to_string()
    } else {
        summary
            .chart_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Item"), Cell::new("Value")]);

    table.add_row(vec!["Status".to_string(), status(output)]);
    table.add_row(vec!["Symbols".to_string(), symbols]);
    table.add_row(vec![
        "Analysis type".to_string(),
        summary.analysis_type.title().to_string(),
    ]);
    table.add_row(vec![
        "Period".to_string(),
        format!("{} ({})", summary.period, summary.interval),
    ]);
    table.add_row(vec!["Charts".to_string(), charts]);
    table.add_row(vec![
        "Report".to_string(),
        display_path(output.report_path.as_ref(), "Not saved"),
    ]);
    table.add_row(vec![
        "Analysis data".to_string(),
        display_path(output.analysis_path.as_ref(), "Not saved"),
    ]);
    table.add_row(vec![
        "Errors".to_string(),
        if summary.errors.is_empty() {
            "None".to_string()
        } else {
            summary.errors.join("\n")
        },
    ]);
    table
}

/// Print the table, then the report when it was not written to disk
pub fn print_run(output: &RunOutput) {
    println!("{}", summary_table(output));

    if let (Some(text), None) = (&output.report_text, &output.report_path) {
        println!("{text}");
    }
    if let (None, Some(recommendation)) = (
        &output.report_text,
        output.summary.recommendations.first(),
    ) {
        println!("\nRecommendations:\n{recommendation}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_core::{AnalysisContext, AnalysisType, Interval, Period};
    use chrono::TimeZone;

    fn symbols(raw: &[&str]) -> Vec<Symbol> {
        Symbol::parse_many(raw.iter().copied()).unwrap()
    }

    fn output(raw: &[&str]) -> RunOutput {
        let ctx = AnalysisContext::new(
            symbols(raw),
            AnalysisType::Comparison,
            Period::SixMonths,
            Interval::OneDay,
        )
        .unwrap();
        RunOutput {
            summary: ctx.summary(),
            cancelled_at: None,
            report_text: None,
            report_path: None,
            analysis_path: None,
        }
    }

    #[test]
    fn test_analysis_file_names() {
        let at = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            analysis_file_name(&symbols(&["AAPL"]), at),
            "AAPL_analysis_20240102_030405.json"
        );
        assert_eq!(
            analysis_file_name(&symbols(&["AAPL", "MSFT"]), at),
            "multi_stock_analysis_20240102_030405.json"
        );
    }

    #[tokio::test]
    async fn test_save_analysis_writes_json() {
        let tmp = tempfile::tempdir().unwrap();
        let run = output(&["NVDA"]);

        let path = save_analysis(&tmp.path().join("out"), &run.summary)
            .await
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["symbols_analyzed"][0], "NVDA");
        assert_eq!(written["analysis_type"], "comparison");
    }

    #[test]
    fn test_summary_table_rows() {
        let mut run = output(&["AAPL", "MSFT"]);
        run.summary.errors.push("Failed to collect data for MSFT: timeout".to_string());
        let rendered = summary_table(&run).to_string();

        assert!(rendered.contains("Completed with 1 error(s)"));
        assert!(rendered.contains("AAPL, MSFT"));
        assert!(rendered.contains("6mo (1d)"));
        assert!(rendered.contains("Not saved"));
    }

    #[test]
    fn test_cancelled_status() {
        let mut run = output(&["AAPL"]);
        run.cancelled_at = Some(analyst_core::Stage::SentimentAnalysis);
        assert!(status(&run).starts_with("Cancelled before"));
    }
}
