//! Equity analyst command-line interface
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//! export ALPHA_VANTAGE_API_KEY="..."   # optional, enables fundamentals
//! export FINNHUB_API_KEY="..."         # optional, enables news
//!
//! equity-analyst --symbols AAPL MSFT --analysis-type comparison --period 6mo
//! equity-analyst --interactive
//! ```

mod app;
mod args;
mod interactive;
mod output;

use crate::app::{App, Request};
use crate::args::Args;
use analyst_utils::{LogFormat, init_tracing_with};
use anyhow::Context;
use clap::Parser;
use std::io;
use tracing::{debug, info};

const DEFAULT_LOG_FILTER: &str = "warn,analyst_workflow=info,analyst_cli=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env file is normal
        debug!("no .env loaded: {e}");
    }

    let args = Args::parse();
    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing_with(DEFAULT_LOG_FILTER, format);

    args.validate().map_err(anyhow::Error::msg)?;

    let app = App::from_env(args.parallel).context("failed to initialise equity analyst")?;
    info!(
        "pipeline ready: {}",
        app.pipeline()
            .stages()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    if args.interactive {
        let stdin = io::stdin();
        return interactive::run(&app, stdin.lock(), io::stdout(), args.audience).await;
    }

    let request = Request {
        symbols: args.symbols,
        analysis_type: args.analysis_type,
        period: args.period,
        interval: args.interval,
        report_type: args.report_type,
        audience: args.audience,
        write_report: !args.no_report,
        save: !args.no_save,
    };

    let result = app.run(&request).await?;
    output::print_run(&result);

    if let Some(stage) = result.cancelled_at {
        anyhow::bail!("analysis interrupted before {stage}");
    }
    Ok(())
}
