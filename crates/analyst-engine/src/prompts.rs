//! Prompt templates for the narrative calls

use analyst_core::{AnalysisError, Result};
use minijinja::Environment;
use serde::Serialize;

pub const SENTIMENT_SYSTEM: &str =
    "You are a financial analyst specializing in market sentiment analysis.";
pub const INSIGHTS_SYSTEM: &str =
    "You are a senior financial analyst providing investment insights.";
pub const RECOMMENDATIONS_SYSTEM: &str =
    "You are a portfolio manager providing investment recommendations.";

pub const SENTIMENT: &str = "sentiment";
pub const INSIGHTS: &str = "insights";
pub const RECOMMENDATIONS: &str = "recommendations";

const SENTIMENT_TEMPLATE: &str = "\
Analyze the market sentiment for {{ symbol }} ({{ company }}) based on:

Recent News Headlines: {{ headlines | join(\"; \") }}
Current Price: ${{ price }}
1-day change: {{ change_1d }}
1-week change: {{ change_1w }}

Provide a brief sentiment assessment (Bullish/Bearish/Neutral) with reasoning.";

const INSIGHTS_TEMPLATE: &str = "\
Based on the comprehensive financial analysis below, provide key insights and observations:

{{ analysis }}

Please provide:
1. Key strengths and weaknesses for each stock
2. Risk assessment
3. Investment themes and opportunities
4. Comparative analysis if multiple stocks

Keep the response concise but informative.";

const RECOMMENDATIONS_TEMPLATE: &str = "\
Based on the comprehensive financial analysis, provide specific investment recommendations:

Analysis Data: {{ analysis }}

Please provide:
1. Investment recommendation for each stock (Buy/Hold/Sell)
2. Rationale for each recommendation
3. Risk level assessment
4. Suggested position sizing or portfolio allocation
5. Key factors to monitor going forward

Be specific and actionable in your recommendations.";

/// Registered prompt templates, compiled once
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl PromptLibrary {
    /// Library with the sentiment, insights and recommendations templates
    pub fn new() -> Result<Self> {
        let mut library = Self {
            env: Environment::new(),
        };
        library.add_template(SENTIMENT, SENTIMENT_TEMPLATE)?;
        library.add_template(INSIGHTS, INSIGHTS_TEMPLATE)?;
        library.add_template(RECOMMENDATIONS, RECOMMENDATIONS_TEMPLATE)?;
        Ok(library)
    }

    /// Register or replace a template
    pub fn add_template(&mut self, name: &'static str, source: &'static str) -> Result<()> {
        self.env
            .add_template(name, source)
            .map_err(|e| AnalysisError::Config(format!("invalid prompt template '{name}': {e}")))
    }

    /// Render template `name` with `vars`
    pub fn render(&self, name: &str, vars: impl Serialize) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| AnalysisError::Generation(format!("prompt '{name}': {e}")))?;

        template
            .render(minijinja::Value::from_serialize(&vars))
            .map_err(|e| AnalysisError::Generation(format!("prompt '{name}': {e}")))
    }
}

/// Two decimals, or `N/A` when absent
pub fn fmt_number(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

/// Like [`fmt_number`] with a `%` suffix on defined values
pub fn fmt_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}%"))
}
