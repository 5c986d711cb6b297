//! Command-line arguments

use analyst_core::{AnalysisType, Interval, Period};
use analyst_report::{Audience, ReportType};
use clap::Parser;
use std::fmt::Display;
use std::str::FromStr;

fn parse_value<T>(raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>().map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(name = "equity-analyst", version)]
#[command(about = "Technical, fundamental and sentiment analysis of stocks with LLM-written reports", long_about = None)]
pub struct Args {
    /// Ticker symbols to analyze (space or comma separated)
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// single, comparison or portfolio
    #[arg(short = 't', long, default_value = "single", value_parser = parse_value::<AnalysisType>)]
    pub analysis_type: AnalysisType,

    /// History window, e.g. 6mo or 1y (defaults to DEFAULT_PERIOD)
    #[arg(short, long, value_parser = parse_value::<Period>)]
    pub period: Option<Period>,

    /// Bar interval, e.g. 1d (defaults to DEFAULT_INTERVAL)
    #[arg(short, long, value_parser = parse_value::<Interval>)]
    pub interval: Option<Interval>,

    /// executive, detailed or investor_presentation
    #[arg(long, default_value = "detailed", value_parser = parse_value::<ReportType>)]
    pub report_type: ReportType,

    /// executives, investors or analysts
    #[arg(long, default_value = "investors", value_parser = parse_value::<Audience>)]
    pub audience: Audience,

    /// Skip the written report
    #[arg(long)]
    pub no_report: bool,

    /// Do not write the report or analysis JSON to disk
    #[arg(long)]
    pub no_save: bool,

    /// Menu-driven mode reading from stdin
    #[arg(long)]
    pub interactive: bool,

    /// Process symbols concurrently within each stage
    #[arg(long)]
    pub parallel: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "ANALYST_LOG_JSON")]
    pub log_json: bool,
}

impl Args {
    /// Non-interactive runs need something to analyze
    pub fn validate(&self) -> Result<(), String> {
        if !self.interactive && self.symbols.iter().all(|s| s.trim().is_empty()) {
            return Err("at least one symbol is required (use --symbols or --interactive)".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["equity-analyst", "--symbols", "AAPL"]).unwrap();
        assert_eq!(args.symbols, vec!["AAPL"]);
        assert_eq!(args.analysis_type, AnalysisType::Single);
        assert_eq!(args.report_type, ReportType::Detailed);
        assert_eq!(args.audience, Audience::Investors);
        assert!(args.period.is_none());
        assert!(!args.no_report);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_multiple_symbols_and_options() {
        let args = Args::try_parse_from([
            "equity-analyst",
            "--symbols",
            "AAPL",
            "MSFT,GOOGL",
            "--analysis-type",
            "comparison",
            "--period",
            "6mo",
            "--interval",
            "1wk",
            "--report-type",
            "executive",
            "--no-save",
            "--parallel",
        ])
        .unwrap();

        assert_eq!(args.symbols, vec!["AAPL", "MSFT", "GOOGL"]);
        assert_eq!(args.analysis_type, AnalysisType::Comparison);
        assert_eq!(args.period, Some(Period::SixMonths));
        assert_eq!(args.interval, Some(Interval::OneWeek));
        assert_eq!(args.report_type, ReportType::Executive);
        assert!(args.no_save);
        assert!(args.parallel);
    }

    #[test]
    fn test_invalid_period_rejected() {
        let result = Args::try_parse_from(["equity-analyst", "--symbols", "AAPL", "--period", "7y"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_symbols_required_unless_interactive() {
        let args = Args::try_parse_from(["equity-analyst"]).unwrap();
        assert!(args.validate().is_err());

        let args = Args::try_parse_from(["equity-analyst", "--interactive"]).unwrap();
        assert!(args.validate().is_ok());
    }
}
