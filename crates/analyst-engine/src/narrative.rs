//! LLM-written sentiment, insights and recommendations
//!
//! Each operation is a single request to the [`TextGenerator`] bounded by a
//! timeout. Any failure (prompt rendering, generation error, timeout) is turned
//! into the operation's fixed fallback text and handed back alongside the error
//! so the caller can log it. The model's output is never parsed.

use crate::prompts::{
    self, INSIGHTS_SYSTEM, PromptLibrary, RECOMMENDATIONS_SYSTEM, SENTIMENT_SYSTEM, fmt_number,
    fmt_percent,
};
use analyst_core::{
    AnalysisContext, AnalysisError, AnalysisType, FundamentalAssessment, NewsItem, Result,
    SentimentResult, Symbol, TechnicalSummary,
};
use analyst_llm::TextGenerator;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const SENTIMENT_FALLBACK: &str = "Neutral - Unable to analyze";
pub const INSIGHTS_FALLBACK: &str = "Unable to generate insights due to an error.";
pub const RECOMMENDATIONS_FALLBACK: &str = "Unable to generate recommendations due to an error.";

/// Headlines beyond this many are left out of the sentiment prompt
const PROMPT_HEADLINES: usize = 3;

/// Generated text, or the fixed fallback and the error that caused it
#[derive(Debug)]
pub enum Narrative {
    Generated(String),
    Fallback { text: String, error: AnalysisError },
}

impl Narrative {
    fn fallback(text: &str, error: AnalysisError) -> Self {
        Narrative::Fallback {
            text: text.to_string(),
            error,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Narrative::Generated(text) | Narrative::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Narrative::Fallback { .. })
    }

    pub fn into_parts(self) -> (String, Option<AnalysisError>) {
        match self {
            Narrative::Generated(text) => (text, None),
            Narrative::Fallback { text, error } => (text, Some(error)),
        }
    }
}

/// Everything the sentiment prompt needs for one symbol
#[derive(Debug, Clone, Copy)]
pub struct SentimentInput<'a> {
    pub symbol: &'a Symbol,
    pub company_name: &'a str,
    pub current_price: Option<f64>,
    pub news: &'a [NewsItem],
    pub price_change_1d: Option<f64>,
    pub price_change_1w: Option<f64>,
}

/// Borrowed view of the per-symbol results, serialized into the aggregate prompts
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AnalysisView<'a> {
    pub technical: &'a BTreeMap<Symbol, TechnicalSummary>,
    pub fundamental: &'a BTreeMap<Symbol, FundamentalAssessment>,
    pub sentiment: &'a BTreeMap<Symbol, SentimentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<&'a str>,
}

impl<'a> AnalysisView<'a> {
    pub fn of(ctx: &'a AnalysisContext) -> Self {
        Self {
            technical: &ctx.technical,
            fundamental: &ctx.fundamental,
            sentiment: &ctx.sentiment,
            insights: ctx.insights.as_deref(),
        }
    }
}

pub struct NarrativeSynthesizer {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptLibrary,
    timeout: Duration,
}

impl NarrativeSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Result<Self> {
        Ok(Self::with_prompts(generator, PromptLibrary::new()?, timeout))
    }

    pub fn with_prompts(
        generator: Arc<dyn TextGenerator>,
        prompts: PromptLibrary,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            prompts,
            timeout,
        }
    }

    /// Sentiment for one symbol
    ///
    /// The fallback result reports zero news items.
    #[instrument(skip(self, input), fields(symbol = %input.symbol))]
    pub async fn sentiment(
        &self,
        input: &SentimentInput<'_>,
    ) -> (SentimentResult, Option<AnalysisError>) {
        let headlines: Vec<&str> = input
            .news
            .iter()
            .take(PROMPT_HEADLINES)
            .map(|n| n.title.as_str())
            .collect();

        let vars = json!({
            "symbol": input.symbol,
            "company": input.company_name,
            "headlines": headlines,
            "price": fmt_number(input.current_price),
            "change_1d": fmt_percent(input.price_change_1d),
            "change_1w": fmt_percent(input.price_change_1w),
        });

        match self.complete(SENTIMENT_SYSTEM, prompts::SENTIMENT, vars).await {
            Ok(text) => (
                SentimentResult {
                    sentiment_text: text,
                    news_item_count: input.news.len(),
                    fallback: false,
                },
                None,
            ),
            Err(e) => {
                warn!(error = %e, "sentiment generation failed");
                (
                    SentimentResult {
                        sentiment_text: SENTIMENT_FALLBACK.to_string(),
                        news_item_count: 0,
                        fallback: true,
                    },
                    Some(e),
                )
            }
        }
    }

    /// Cross-symbol insights from the technical, fundamental and sentiment maps
    #[instrument(skip_all, fields(symbols = symbols.len()))]
    pub async fn insights(&self, symbols: &[Symbol], view: AnalysisView<'_>) -> Narrative {
        let summary = json!({
            "symbols": symbols,
            "technical": view.technical,
            "fundamental": view.fundamental,
            "sentiment": view.sentiment,
        });

        self.aggregate(INSIGHTS_SYSTEM, prompts::INSIGHTS, &summary, INSIGHTS_FALLBACK)
            .await
    }

    /// Buy/hold/sell recommendations over the full analysis
    #[instrument(skip_all, fields(symbols = symbols.len(), analysis_type = %analysis_type))]
    pub async fn recommendations(
        &self,
        symbols: &[Symbol],
        analysis_type: AnalysisType,
        view: AnalysisView<'_>,
    ) -> Narrative {
        let data = json!({
            "analysis": view,
            "symbols": symbols,
            "analysis_type": analysis_type,
        });

        self.aggregate(
            RECOMMENDATIONS_SYSTEM,
            prompts::RECOMMENDATIONS,
            &data,
            RECOMMENDATIONS_FALLBACK,
        )
        .await
    }

    async fn aggregate(
        &self,
        system: &str,
        template: &str,
        data: &serde_json::Value,
        fallback: &str,
    ) -> Narrative {
        let analysis = match serde_json::to_string_pretty(data) {
            Ok(analysis) => analysis,
            Err(e) => return Narrative::fallback(fallback, e.into()),
        };

        match self
            .complete(system, template, json!({ "analysis": analysis }))
            .await
        {
            Ok(text) => Narrative::Generated(text),
            Err(e) => {
                warn!(template, error = %e, "generation failed, using fallback");
                Narrative::fallback(fallback, e)
            }
        }
    }

    async fn complete(
        &self,
        system: &str,
        template: &str,
        vars: serde_json::Value,
    ) -> Result<String> {
        let prompt = self.prompts.render(template, vars)?;
        debug!(template, chars = prompt.len(), "prompt rendered");

        match tokio::time::timeout(self.timeout, self.generator.generate(system, &prompt)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(AnalysisError::Generation(e.to_string())),
            Err(_) => Err(AnalysisError::Generation(format!(
                "{template} timed out after {:?}",
                self.timeout
            ))),
        }
    }
}
