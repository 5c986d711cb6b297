//! Menu-driven mode

use crate::app::{App, Request};
use crate::output;
use analyst_core::{AnalysisType, Period};
use analyst_report::{Audience, ReportType};
use std::io::{BufRead, Write};
use std::str::FromStr;

const MENU: &str = "
Available options:
1. Quick Analysis (single stock)
2. Compare Stocks
3. Portfolio Analysis
4. Custom Analysis
5. Exit";

/// What the user picked from the menu
#[derive(Debug)]
pub enum MenuAction {
    Run(Request),
    Invalid(String),
    Exit,
}

/// Print `question` and read one trimmed line; `None` at end of input
fn ask<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: &str,
) -> std::io::Result<Option<String>> {
    write!(out, "{question}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Answer parsed as `T`, or `default` when left blank
fn ask_parsed<T, R, W>(
    input: &mut R,
    out: &mut W,
    question: &str,
    default: T,
) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    R: BufRead,
    W: Write,
{
    match ask(input, out, question)? {
        None => Ok(None),
        Some(answer) if answer.is_empty() => Ok(Some(default)),
        Some(answer) => Ok(Some(answer.parse::<T>()?)),
    }
}

fn ask_yes<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: &str,
) -> anyhow::Result<Option<bool>> {
    Ok(ask(input, out, question)?.map(|a| !a.eq_ignore_ascii_case("n")))
}

fn split_symbols(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_uppercase).collect()
}

fn preset(
    symbols: Vec<String>,
    analysis_type: AnalysisType,
    period: Period,
    audience: Audience,
) -> Request {
    Request {
        symbols,
        analysis_type,
        period: Some(period),
        interval: None,
        report_type: ReportType::Detailed,
        audience,
        write_report: true,
        save: true,
    }
}

/// Show the menu and collect one request; `None` at end of input
pub fn read_action<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    audience: Audience,
) -> anyhow::Result<Option<MenuAction>> {
    writeln!(out, "{MENU}")?;
    let Some(choice) = ask(input, out, "\nSelect an option (1-5): ")? else {
        return Ok(None);
    };

    let action = match choice.as_str() {
        "1" => {
            let Some(symbol) = ask(input, out, "Enter stock symbol: ")? else {
                return Ok(None);
            };
            let Some(period) = ask_parsed(
                input,
                out,
                "Enter period (1mo/3mo/6mo/1y/2y): ",
                Period::SixMonths,
            )?
            else {
                return Ok(None);
            };
            MenuAction::Run(preset(
                split_symbols(&symbol),
                AnalysisType::Single,
                period,
                audience,
            ))
        }
        "2" | "3" => {
            let (question, analysis_type) = if choice == "2" {
                ("Enter stock symbols (space-separated): ", AnalysisType::Comparison)
            } else {
                ("Enter portfolio symbols (space-separated): ", AnalysisType::Portfolio)
            };
            let Some(symbols) = ask(input, out, question)? else {
                return Ok(None);
            };
            let Some(period) =
                ask_parsed(input, out, "Enter period (6mo/1y/2y): ", Period::OneYear)?
            else {
                return Ok(None);
            };
            MenuAction::Run(preset(
                split_symbols(&symbols),
                analysis_type,
                period,
                audience,
            ))
        }
        "4" => match read_custom(input, out, audience)? {
            Some(request) => MenuAction::Run(request),
            None => return Ok(None),
        },
        "5" => MenuAction::Exit,
        other => MenuAction::Invalid(other.to_string()),
    };
    Ok(Some(action))
}

fn read_custom<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    audience: Audience,
) -> anyhow::Result<Option<Request>> {
    writeln!(out, "\nCustom Analysis Configuration:")?;
    let Some(symbols) = ask(input, out, "Stock symbols (space-separated): ")? else {
        return Ok(None);
    };
    let Some(analysis_type) = ask_parsed(
        input,
        out,
        "Analysis type (single/comparison/portfolio): ",
        AnalysisType::Single,
    )?
    else {
        return Ok(None);
    };
    let Some(period) = ask_parsed(
        input,
        out,
        "Period (1mo/3mo/6mo/1y/2y/5y): ",
        Period::OneYear,
    )?
    else {
        return Ok(None);
    };
    let Some(report_type) = ask_parsed(
        input,
        out,
        "Report type (executive/detailed/investor_presentation): ",
        ReportType::Detailed,
    )?
    else {
        return Ok(None);
    };
    let Some(write_report) = ask_yes(input, out, "Generate report? (y/n): ")? else {
        return Ok(None);
    };
    let Some(save) = ask_yes(input, out, "Save results? (y/n): ")? else {
        return Ok(None);
    };

    Ok(Some(Request {
        symbols: split_symbols(&symbols),
        analysis_type,
        period: Some(period),
        interval: None,
        report_type,
        audience,
        write_report,
        save,
    }))
}

/// Loop over the menu until exit or end of input
pub async fn run<R: BufRead, W: Write>(
    app: &App,
    mut input: R,
    mut out: W,
    audience: Audience,
) -> anyhow::Result<()> {
    writeln!(out, "\nEquity Analyst - Interactive Mode\n{}", "=".repeat(50))?;

    loop {
        let action = match read_action(&mut input, &mut out, audience) {
            Ok(Some(action)) => action,
            Ok(None) => break,
            Err(e) => {
                writeln!(out, "Error: {e}")?;
                continue;
            }
        };

        match action {
            MenuAction::Run(request) => {
                writeln!(out, "\nAnalyzing {}...", request.symbols.join(", "))?;
                match app.run(&request).await {
                    Ok(result) => output::print_run(&result),
                    Err(e) => writeln!(out, "Error: {e:#}")?,
                }
            }
            MenuAction::Invalid(choice) => {
                writeln!(out, "Invalid option '{choice}'. Please select 1-5.")?;
            }
            MenuAction::Exit => break,
        }
    }

    writeln!(out, "Goodbye!")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn action(script: &str) -> Option<MenuAction> {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        read_action(&mut input, &mut out, Audience::Investors).unwrap()
    }

    #[test]
    fn test_quick_analysis_defaults_to_six_months() {
        let Some(MenuAction::Run(request)) = action("1\naapl\n\n") else {
            panic!("expected a run");
        };
        assert_eq!(request.symbols, vec!["AAPL"]);
        assert_eq!(request.analysis_type, AnalysisType::Single);
        assert_eq!(request.period, Some(Period::SixMonths));
        assert!(request.write_report);
        assert!(request.save);
    }

    #[test]
    fn test_compare_and_portfolio() {
        let Some(MenuAction::Run(compare)) = action("2\naapl msft\n2y\n") else {
            panic!("expected a run");
        };
        assert_eq!(compare.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(compare.analysis_type, AnalysisType::Comparison);
        assert_eq!(compare.period, Some(Period::TwoYears));

        let Some(MenuAction::Run(portfolio)) = action("3\nspy qqq\n\n") else {
            panic!("expected a run");
        };
        assert_eq!(portfolio.analysis_type, AnalysisType::Portfolio);
        assert_eq!(portfolio.period, Some(Period::OneYear));
    }

    #[test]
    fn test_custom_analysis() {
        let Some(MenuAction::Run(request)) =
            action("4\nnvda amd\nportfolio\n3mo\nexecutive\nn\ny\n")
        else {
            panic!("expected a run");
        };
        assert_eq!(request.symbols, vec!["NVDA", "AMD"]);
        assert_eq!(request.analysis_type, AnalysisType::Portfolio);
        assert_eq!(request.period, Some(Period::ThreeMonths));
        assert_eq!(request.report_type, ReportType::Executive);
        assert!(!request.write_report);
        assert!(request.save);
    }

    #[test]
    fn test_invalid_period_is_an_error() {
        let mut input = Cursor::new(b"1\naapl\n7y\n".to_vec());
        let mut out = Vec::new();
        assert!(read_action(&mut input, &mut out, Audience::Investors).is_err());
    }

    #[test]
    fn test_exit_invalid_and_eof() {
        assert!(matches!(action("5\n"), Some(MenuAction::Exit)));
        assert!(matches!(action("9\n"), Some(MenuAction::Invalid(c)) if c == "9"));
        assert!(action("").is_none());
        assert!(action("1\n").is_none());
    }
}
