//! LLM-written report sections

use crate::report::{Report, ReportMetadata};
use crate::section::{ReportSection, SectionKind};
use crate::{ReportError, Result};
use analyst_core::{AnalysisSummary, Symbol};
use analyst_llm::TextGenerator;
use chrono::Local;
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Depth and framing of the written report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Executive,
    #[default]
    Detailed,
    InvestorPresentation,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Executive => "executive",
            ReportType::Detailed => "detailed",
            ReportType::InvestorPresentation => "investor_presentation",
        }
    }

    fn phrase(&self) -> &'static str {
        match self {
            ReportType::Executive => "an executive",
            ReportType::Detailed => "a detailed",
            ReportType::InvestorPresentation => "an investor presentation",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "executive" => Ok(ReportType::Executive),
            "detailed" => Ok(ReportType::Detailed),
            "investor_presentation" => Ok(ReportType::InvestorPresentation),
            _ => Err(ReportError::InvalidReportType(s.to_string())),
        }
    }
}

/// Intended readers of the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Executives,
    #[default]
    Investors,
    Analysts,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Executives => "executives",
            Audience::Investors => "investors",
            Audience::Analysts => "analysts",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "executives" => Ok(Audience::Executives),
            "investors" => Ok(Audience::Investors),
            "analysts" => Ok(Audience::Analysts),
            _ => Err(ReportError::InvalidAudience(s.to_string())),
        }
    }
}

const FRAMING: &str = "This section belongs to {{ report_phrase }} report written for {{ audience }}.";

const EXECUTIVE_SUMMARY: &str = "\
Write a professional executive summary for a financial analysis report based on the following data:

Symbols Analyzed: {{ symbols }}
Analysis Period: {{ period }}
Analysis Type: {{ analysis_type }}

Key Insights: {{ insights }}

Recommendations Summary: {{ recommendation }}

The executive summary should be:
- Concise (2-3 paragraphs)
- Highlight key findings and investment thesis
- Include primary recommendations
- Written for senior executives and decision makers
- Professional and authoritative tone

Do not include technical jargon that executives wouldn't understand.

{% include \"framing\" %}";

const MARKET_ANALYSIS: &str = "\
Write a comprehensive market analysis section for the financial report covering:

Symbols: {{ symbols }}
Analysis Period: {{ period }}

Sentiment Analysis Data: {{ sentiment }}

Technical Trends: {{ technical }}

The market analysis should include:
1. Current market environment and conditions
2. Sector/industry trends affecting these stocks
3. Market sentiment and investor behavior
4. Key market drivers and catalysts
5. Broader economic context (if relevant)

Write in a professional, analytical style suitable for institutional investors.
Length: 3-4 paragraphs.

{% include \"framing\" %}";

const TECHNICAL_ANALYSIS: &str = "\
Write a detailed technical analysis section based on the following data:

Technical Analysis Data: {{ technical }}

The technical analysis should cover:
1. Price trends and momentum indicators
2. Moving average analysis
3. RSI and overbought/oversold conditions
4. Volatility analysis
5. Volume trends and patterns
6. Support and resistance levels (if identifiable)
7. Technical signals and chart patterns

For each stock analyzed, provide:
- Current technical position
- Key technical levels to watch
- Short-term and medium-term technical outlook

Write for readers familiar with technical analysis terminology.
Length: 4-5 paragraphs.

{% include \"framing\" %}";

const FUNDAMENTAL_ANALYSIS: &str = "\
Write a comprehensive fundamental analysis section based on:

Fundamental Analysis Data: {{ fundamental }}

The fundamental analysis should cover:
1. Valuation metrics (P/E, P/B, etc.) and assessment
2. Profitability analysis (margins, ROE, ROA)
3. Growth metrics and trends
4. Financial health and balance sheet strength
5. Competitive positioning within sector/industry
6. Business model and revenue drivers
7. Management quality and corporate governance (if data available)

For each stock, provide:
- Valuation assessment (undervalued/fairly valued/overvalued)
- Financial strength rating
- Growth prospects
- Key fundamental risks and opportunities

Write for sophisticated investors who understand financial statements.
Length: 5-6 paragraphs.

{% include \"framing\" %}";

const RISK_ASSESSMENT: &str = "\
Write a thorough risk assessment section based on the analysis data:

Risk Analysis Data: {{ risk }}

The risk assessment should identify and analyze:
1. Market risks (volatility, beta, correlation)
2. Company-specific risks (financial leverage, profitability)
3. Sector/industry risks
4. Technical risks (trend reversals, support/resistance breaks)
5. Valuation risks (overvaluation concerns)
6. Liquidity risks
7. Macroeconomic risks
8. ESG and regulatory risks (if applicable)

For each risk category:
- Assess the probability and potential impact
- Provide risk mitigation strategies
- Highlight early warning indicators

Risk assessment should be balanced - not overly pessimistic but realistic.
Length: 4-5 paragraphs.

{% include \"framing\" %}";

const RECOMMENDATIONS: &str = "\
Write a detailed investment recommendations section based on the complete analysis:

Generated Recommendations: {{ recommendation }}

Analysis Summary: {{ insights }}

The recommendations section should include:
1. Specific investment recommendations for each stock (Buy/Hold/Sell)
2. Rationale for each recommendation
3. Target price ranges (if determinable from analysis)
4. Time horizon for recommendations
5. Position sizing suggestions
6. Portfolio construction considerations
7. Rebalancing triggers and monitoring criteria
8. Alternative scenarios and contingency plans

Structure recommendations by:
- Primary recommendation with confidence level
- Supporting analysis and key factors
- Risk-adjusted return expectations
- Implementation strategy

Be specific and actionable while acknowledging uncertainties.
Length: 4-5 paragraphs.

{% include \"framing\" %}";

fn template_name(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::ExecutiveSummary => "executive_summary",
        SectionKind::MarketAnalysis => "market_analysis",
        SectionKind::TechnicalAnalysis => "technical_analysis",
        SectionKind::FundamentalAnalysis => "fundamental_analysis",
        SectionKind::RiskAssessment => "risk_assessment",
        SectionKind::Recommendations => "recommendations",
    }
}

fn template_source(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::ExecutiveSummary => EXECUTIVE_SUMMARY,
        SectionKind::MarketAnalysis => MARKET_ANALYSIS,
        SectionKind::TechnicalAnalysis => TECHNICAL_ANALYSIS,
        SectionKind::FundamentalAnalysis => FUNDAMENTAL_ANALYSIS,
        SectionKind::RiskAssessment => RISK_ASSESSMENT,
        SectionKind::Recommendations => RECOMMENDATIONS,
    }
}

/// Writes the narrative sections of a report from a finished run
pub struct ReportWriter {
    generator: Arc<dyn TextGenerator>,
    env: Environment<'static>,
    timeout: Duration,
}

impl ReportWriter {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("framing", FRAMING)
            .map_err(|e| ReportError::Template(e.to_string()))?;
        for kind in SectionKind::ALL {
            env.add_template(template_name(kind), template_source(kind))
                .map_err(|e| ReportError::Template(format!("{}: {e}", template_name(kind))))?;
        }

        Ok(Self {
            generator,
            env,
            timeout,
        })
    }

    /// Write every section the summary has data for
    ///
    /// A section that fails is left out of the report and noted in its
    /// messages. Writing never fails as a whole.
    #[instrument(skip_all, fields(symbols = summary.symbols_analyzed.len(), report_type = %report_type))]
    pub async fn write(
        &self,
        summary: &AnalysisSummary,
        report_type: ReportType,
        audience: Audience,
    ) -> Report {
        let metadata = ReportMetadata::from_summary(summary, report_type, audience, Local::now());
        let mut report = Report::new(metadata, summary.chart_paths.clone());
        report
            .messages
            .push("Data analysis completed - report structure determined".to_string());

        for kind in SectionKind::ALL {
            if Self::lacks_data(kind, summary) {
                info!("Skipping {kind}: no data available");
                report
                    .messages
                    .push(format!("Skipped {kind} - no data available"));
                continue;
            }

            let outcome = match self.section_vars(kind, summary, report_type, audience) {
                Ok(vars) => self.write_section(kind, vars).await,
                Err(e) => Err(e),
            };

            match outcome.and_then(|content| report.add_section(ReportSection::new(kind, content)))
            {
                Ok(()) => report.messages.push(format!("{} completed", kind.title())),
                Err(e) => {
                    warn!(section = %kind, error = %e, "report section failed");
                    report.messages.push(format!("Error in {kind}: {e}"));
                }
            }
        }

        report
            .messages
            .push("Final report compilation completed".to_string());
        report
    }

    fn lacks_data(kind: SectionKind, summary: &AnalysisSummary) -> bool {
        match kind {
            SectionKind::TechnicalAnalysis => summary.technical_analysis.is_empty(),
            SectionKind::FundamentalAnalysis => summary.fundamental_analysis.is_empty(),
            _ => false,
        }
    }

    fn section_vars(
        &self,
        kind: SectionKind,
        summary: &AnalysisSummary,
        report_type: ReportType,
        audience: Audience,
    ) -> Result<Value> {
        let symbols = summary
            .symbols_analyzed
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let insights = (!summary.insights.is_empty()).then_some(summary.insights.as_str());
        let recommendation = summary.recommendations.first().map(String::as_str);

        let mut vars = json!({
            "symbols": symbols,
            "period": summary.period,
            "analysis_type": summary.analysis_type,
            "report_phrase": report_type.phrase(),
            "audience": audience,
        });

        let extra = match kind {
            SectionKind::ExecutiveSummary => json!({
                "insights": insights.unwrap_or("N/A"),
                "recommendation": recommendation.unwrap_or("N/A"),
            }),
            SectionKind::MarketAnalysis => json!({
                "sentiment": serde_json::to_string_pretty(&summary.sentiment_analysis)?,
                "technical": serde_json::to_string_pretty(&summary.technical_analysis)?,
            }),
            SectionKind::TechnicalAnalysis => json!({
                "technical": serde_json::to_string_pretty(&summary.technical_analysis)?,
            }),
            SectionKind::FundamentalAnalysis => json!({
                "fundamental": serde_json::to_string_pretty(&summary.fundamental_analysis)?,
            }),
            SectionKind::RiskAssessment => {
                let risk = json!({
                    "technical_risks": summary.technical_analysis,
                    "fundamental_risks": summary.fundamental_analysis,
                    "sentiment_risks": summary.sentiment_analysis,
                    "symbols": summary.symbols_analyzed,
                });
                json!({ "risk": serde_json::to_string_pretty(&risk)? })
            }
            SectionKind::Recommendations => json!({
                "recommendation": recommendation.unwrap_or("No specific recommendations available"),
                "insights": insights.unwrap_or("No insights available"),
            }),
        };

        if let (Value::Object(base), Value::Object(extra)) = (&mut vars, extra) {
            base.extend(extra);
        }
        Ok(vars)
    }

    /// Render the section prompt without calling the generator
    pub fn render_prompt(
        &self,
        kind: SectionKind,
        summary: &AnalysisSummary,
        report_type: ReportType,
        audience: Audience,
    ) -> Result<String> {
        let vars = self.section_vars(kind, summary, report_type, audience)?;
        self.render(kind, &vars)
    }

    fn render(&self, kind: SectionKind, vars: &Value) -> Result<String> {
        self.env
            .get_template(template_name(kind))
            .and_then(|t| t.render(vars))
            .map_err(|e| ReportError::Template(format!("{}: {e}", template_name(kind))))
    }

    #[instrument(skip(self, vars), fields(section = %kind))]
    async fn write_section(&self, kind: SectionKind, vars: Value) -> Result<String> {
        let prompt = self.render(kind, &vars)?;
        debug!("prompt is {} chars", prompt.len());

        tokio::time::timeout(
            self.timeout,
            self.generator.generate(kind.system_prompt(), &prompt),
        )
        .await
        .map_err(|_| ReportError::Timeout(self.timeout))?
        .map_err(|e| ReportError::Generation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_core::{
        AnalysisType, FundamentalAssessment, Interval, Period, SentimentResult, TechnicalSummary,
        TrendSignal, VolumeTrend,
    };
    use analyst_llm::LLMError;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Records system prompts and fails on the ones it is told to
    struct RecordingGenerator {
        calls: Mutex<Vec<(String, String)>>,
        fail_on: Option<&'static str>,
    }

    impl RecordingGenerator {
        fn new(fail_on: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_on,
            })
        }

        fn systems(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(s, _)| s.clone())
                .collect()
        }
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(
            &self,
            system_prompt: &str,
            user_prompt: &str,
        ) -> analyst_llm::Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            if self.fail_on.is_some_and(|f| system_prompt.contains(f)) {
                return Err(LLMError::Api {
                    provider: "stub",
                    status: 500,
                    body: "upstream 500".to_string(),
                });
            }
            Ok(format!("text for: {system_prompt}"))
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _: &str, _: &str) -> analyst_llm::Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    fn summary(with_technical: bool, with_fundamental: bool) -> AnalysisSummary {
        let aapl = Symbol::parse("AAPL").unwrap();
        let mut technical = BTreeMap::new();
        if with_technical {
            technical.insert(
                aapl.clone(),
                TechnicalSummary {
                    current_price: 190.0,
                    observations: 120,
                    ma_20: Some(185.0),
                    ma_50: None,
                    rsi: Some(61.2),
                    price_change_1d: Some(0.4),
                    price_change_1w: Some(1.9),
                    price_change_1m: None,
                    volatility: Some(22.5),
                    trend_signal: TrendSignal::default(),
                    volume_trend: VolumeTrend::Stable,
                    signals: vec!["Price above 20-day MA".to_string()],
                },
            );
        }
        let mut fundamental = BTreeMap::new();
        if with_fundamental {
            fundamental.insert(aapl.clone(), FundamentalAssessment::default());
        }
        let mut sentiment = BTreeMap::new();
        sentiment.insert(
            aapl.clone(),
            SentimentResult {
                sentiment_text: "Bullish".to_string(),
                news_item_count: 3,
                fallback: false,
            },
        );

        AnalysisSummary {
            run_id: "run-1".to_string(),
            symbols_analyzed: vec![aapl],
            analysis_type: AnalysisType::Single,
            period: Period::SixMonths,
            interval: Interval::OneDay,
            technical_analysis: technical,
            fundamental_analysis: fundamental,
            sentiment_analysis: sentiment,
            insights: "Strong momentum".to_string(),
            recommendations: vec!["HOLD AAPL".to_string()],
            chart_paths: Vec::new(),
            messages: Vec::new(),
            errors: Vec::new(),
            started_at: chrono::Utc::now(),
            finished_at: None,
        }
    }

    #[tokio::test]
    async fn test_writes_all_sections_in_order() {
        let generator = RecordingGenerator::new(None);
        let writer = ReportWriter::new(generator.clone(), Duration::from_secs(5)).unwrap();

        let report = writer
            .write(&summary(true, true), ReportType::Detailed, Audience::Investors)
            .await;

        let kinds: Vec<SectionKind> = report.sections().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SectionKind::ALL.to_vec());
        assert_eq!(generator.systems().len(), 6);
        assert!(report.messages.contains(&"Executive Summary completed".to_string()));
        assert_eq!(
            report.messages.last().map(String::as_str),
            Some("Final report compilation completed")
        );
    }

    #[tokio::test]
    async fn test_skips_sections_without_data() {
        let generator = RecordingGenerator::new(None);
        let writer = ReportWriter::new(generator.clone(), Duration::from_secs(5)).unwrap();

        let report = writer
            .write(&summary(false, false), ReportType::Executive, Audience::Executives)
            .await;

        assert!(!report.has_section(SectionKind::TechnicalAnalysis));
        assert!(!report.has_section(SectionKind::FundamentalAnalysis));
        assert_eq!(report.sections().len(), 4);
        assert!(
            report
                .messages
                .contains(&"Skipped technical analysis - no data available".to_string())
        );
        assert!(
            report
                .messages
                .contains(&"Skipped fundamental analysis - no data available".to_string())
        );
        assert_eq!(generator.systems().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_section_is_omitted() {
        let generator = RecordingGenerator::new(Some("risk management"));
        let writer = ReportWriter::new(generator, Duration::from_secs(5)).unwrap();

        let report = writer
            .write(&summary(true, true), ReportType::Detailed, Audience::Analysts)
            .await;

        assert!(!report.has_section(SectionKind::RiskAssessment));
        assert!(report.has_section(SectionKind::Recommendations));
        assert!(report.messages.iter().any(|m| {
            m.starts_with("Error in risk assessment:") && m.contains("upstream 500")
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_section_timeout() {
        let writer = ReportWriter::new(Arc::new(SlowGenerator), Duration::from_secs(1)).unwrap();

        let report = writer
            .write(&summary(false, false), ReportType::Detailed, Audience::Investors)
            .await;

        assert!(report.sections().is_empty());
        assert!(
            report
                .messages
                .iter()
                .any(|m| m.starts_with("Error in executive summary: Generation timed out"))
        );
    }

    #[test]
    fn test_prompts_carry_data_and_framing() {
        let writer = ReportWriter::new(RecordingGenerator::new(None), Duration::from_secs(5))
            .unwrap();
        let data = summary(true, true);

        let executive = writer
            .render_prompt(
                SectionKind::ExecutiveSummary,
                &data,
                ReportType::InvestorPresentation,
                Audience::Executives,
            )
            .unwrap();
        assert!(executive.contains("Symbols Analyzed: AAPL\nAnalysis Period: 6mo\nAnalysis Type: single"));
        assert!(executive.contains("Key Insights: Strong momentum"));
        assert!(executive.contains("Recommendations Summary: HOLD AAPL"));
        assert!(executive.ends_with(
            "This section belongs to an investor presentation report written for executives."
        ));

        let risk = writer
            .render_prompt(
                SectionKind::RiskAssessment,
                &data,
                ReportType::Detailed,
                Audience::Investors,
            )
            .unwrap();
        assert!(risk.contains("\"technical_risks\""));
        assert!(risk.contains("\"sentiment_text\": \"Bullish\""));
    }

    #[test]
    fn test_recommendation_defaults() {
        let writer = ReportWriter::new(RecordingGenerator::new(None), Duration::from_secs(5))
            .unwrap();
        let mut data = summary(true, true);
        data.insights.clear();
        data.recommendations.clear();

        let prompt = writer
            .render_prompt(
                SectionKind::Recommendations,
                &data,
                ReportType::Detailed,
                Audience::Investors,
            )
            .unwrap();

        assert!(prompt.contains("Generated Recommendations: No specific recommendations available"));
        assert!(prompt.contains("Analysis Summary: No insights available"));
    }

    #[test]
    fn test_parse_report_type_and_audience() {
        assert_eq!(
            "investor-presentation".parse::<ReportType>().unwrap(),
            ReportType::InvestorPresentation
        );
        assert_eq!("Detailed".parse::<ReportType>().unwrap(), ReportType::Detailed);
        assert!(matches!(
            "memo".parse::<ReportType>(),
            Err(ReportError::InvalidReportType(_))
        ));
        assert_eq!("analysts".parse::<Audience>().unwrap(), Audience::Analysts);
        assert!("everyone".parse::<Audience>().is_err());
    }
}
