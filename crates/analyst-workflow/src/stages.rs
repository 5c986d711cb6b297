//! The seven working stages of the analysis pipeline
//!
//! Each stage reads what earlier stages left on the [`AnalysisContext`], writes
//! its own output, and reports a [`StageResult`]. Stages that work per symbol
//! only ever look at `raw_data` keys, so a symbol that failed data collection
//! never reaches them.

use analyst_core::{
    AnalysisContext, AnalysisError, Interval, MarketSnapshot, Period, Result, Stage, StageResult,
    Symbol,
};
use analyst_engine::{
    AnalysisView, ChartRenderer, NarrativeSynthesizer, SentimentInput, assess, summarize,
};
use analyst_market::MarketDataProvider;
use async_trait::async_trait;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One step of the pipeline
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Which state of the sequence this stage implements
    fn stage(&self) -> Stage;

    /// Run against the context; never aborts, failures are logged on `ctx`
    async fn run(&self, ctx: &mut AnalysisContext) -> StageResult;
}

/// Run `f` over `items` either one at a time or all at once, keeping input order
async fn fan_out<I, F, Fut>(items: I, parallel: bool, mut f: F) -> Vec<Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    if parallel {
        return join_all(items.into_iter().map(f)).await;
    }

    let mut results = Vec::new();
    for item in items {
        results.push(f(item).await);
    }
    results
}

/// Await `fut` for at most `limit`; an overrun becomes `on_timeout(limit)`
async fn bounded<T, F, E>(limit: Duration, fut: F, on_timeout: E) -> Result<T>
where
    F: Future<Output = Result<T>>,
    E: FnOnce(Duration) -> AnalysisError,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| on_timeout(limit))?
}

fn skip(ctx: &mut AnalysisContext, what: &str) -> StageResult {
    let reason = format!("Skipped {what} - no data available");
    info!("{reason}");
    ctx.push_message(reason.clone());
    StageResult::Skipped { reason }
}

/// Fetches a [`MarketSnapshot`] for every requested symbol
pub struct DataCollectionStage {
    market: Arc<dyn MarketDataProvider>,
    timeout: Duration,
    parallel: bool,
}

impl DataCollectionStage {
    pub fn new(market: Arc<dyn MarketDataProvider>, timeout: Duration, parallel: bool) -> Self {
        Self {
            market,
            timeout,
            parallel,
        }
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<MarketSnapshot> {
        let fetch = async {
            self.market
                .fetch(symbol, period, interval)
                .await
                .map_err(|e| AnalysisError::data_unavailable(symbol.as_str(), e.to_string()))
        };
        bounded(self.timeout, fetch, |limit| {
            AnalysisError::fetch_timeout(symbol.as_str(), limit)
        })
        .await
    }
}

#[async_trait]
impl PipelineStage for DataCollectionStage {
    fn stage(&self) -> Stage {
        Stage::DataCollection
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> StageResult {
        let symbols = ctx.symbols.clone();
        let (period, interval) = (ctx.period, ctx.interval);

        let results = fan_out(&symbols, self.parallel, |symbol| {
            self.fetch(symbol, period, interval)
        })
        .await;

        let mut failed = 0;
        for (symbol, result) in symbols.iter().zip(results) {
            match result {
                Ok(snapshot) => {
                    debug!(symbol = %symbol, bars = snapshot.series.len(), "data collected");
                    ctx.raw_data.insert(symbol.clone(), snapshot);
                }
                Err(e) => {
                    failed += 1;
                    warn!(symbol = %symbol, error = %e, "data collection failed");
                    ctx.push_error(
                        Some(symbol),
                        &e,
                        format!("Failed to collect data for {symbol}: {e}"),
                    );
                }
            }
        }

        ctx.push_message(format!("Collected data for {} symbols", ctx.raw_data.len()));
        StageResult::from_failures(failed)
    }
}

/// Indicator summary per collected symbol
#[derive(Debug, Default)]
pub struct TechnicalStage;

#[async_trait]
impl PipelineStage for TechnicalStage {
    fn stage(&self) -> Stage {
        Stage::TechnicalAnalysis
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> StageResult {
        if ctx.raw_data.is_empty() {
            return skip(ctx, "technical analysis");
        }

        let outcomes: Vec<_> = ctx
            .raw_data
            .iter()
            .map(|(symbol, snapshot)| (symbol.clone(), summarize(symbol, &snapshot.series)))
            .collect();

        let mut failed = 0;
        for (symbol, outcome) in outcomes {
            match outcome {
                Ok(Some(summary)) => {
                    ctx.technical.insert(symbol, summary);
                }
                Ok(None) => debug!(symbol = %symbol, "empty price series, no indicators"),
                Err(e) => {
                    failed += 1;
                    warn!(symbol = %symbol, error = %e, "technical analysis failed");
                    ctx.push_error(
                        Some(&symbol),
                        &e,
                        format!("Error in technical analysis for {symbol}: {e}"),
                    );
                }
            }
        }

        ctx.push_message("Technical analysis completed");
        StageResult::from_failures(failed)
    }
}

/// Threshold assessment per collected symbol
#[derive(Debug, Default)]
pub struct FundamentalStage;

#[async_trait]
impl PipelineStage for FundamentalStage {
    fn stage(&self) -> Stage {
        Stage::FundamentalAnalysis
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> StageResult {
        if ctx.raw_data.is_empty() {
            return skip(ctx, "fundamental analysis");
        }

        let assessments: Vec<_> = ctx
            .raw_data
            .iter()
            .map(|(symbol, snapshot)| (symbol.clone(), assess(&snapshot.fundamentals)))
            .collect();
        ctx.fundamental.extend(assessments);

        ctx.push_message("Fundamental analysis completed");
        StageResult::Completed
    }
}

/// Model-written sentiment per collected symbol
pub struct SentimentStage {
    synthesizer: Arc<NarrativeSynthesizer>,
    parallel: bool,
}

impl SentimentStage {
    pub fn new(synthesizer: Arc<NarrativeSynthesizer>, parallel: bool) -> Self {
        Self {
            synthesizer,
            parallel,
        }
    }
}

#[async_trait]
impl PipelineStage for SentimentStage {
    fn stage(&self) -> Stage {
        Stage::SentimentAnalysis
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> StageResult {
        if ctx.raw_data.is_empty() {
            return skip(ctx, "sentiment analysis");
        }

        let results = {
            let view: &AnalysisContext = &*ctx;
            fan_out(&view.raw_data, self.parallel, move |(symbol, snapshot)| {
                let technical = view.technical.get(symbol);
                async move {
                    let input = SentimentInput {
                        symbol,
                        company_name: &snapshot.company_name,
                        current_price: snapshot.current_price,
                        news: &snapshot.news,
                        price_change_1d: technical.and_then(|t| t.price_change_1d),
                        price_change_1w: technical.and_then(|t| t.price_change_1w),
                    };
                    let (result, error) = self.synthesizer.sentiment(&input).await;
                    (symbol.clone(), result, error)
                }
            })
            .await
        };

        let mut failed = 0;
        for (symbol, result, error) in results {
            if let Some(e) = error {
                failed += 1;
                ctx.push_error(
                    Some(&symbol),
                    &e,
                    format!("Error in sentiment analysis for {symbol}: {e}"),
                );
            }
            ctx.sentiment.insert(symbol, result);
        }

        ctx.push_message("Market sentiment analysis completed");
        StageResult::from_failures(failed)
    }
}

/// One aggregate insights call across all symbols
pub struct InsightsStage {
    synthesizer: Arc<NarrativeSynthesizer>,
}

impl InsightsStage {
    pub fn new(synthesizer: Arc<NarrativeSynthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl PipelineStage for InsightsStage {
    fn stage(&self) -> Stage {
        Stage::GenerateInsights
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> StageResult {
        if ctx.raw_data.is_empty() {
            return skip(ctx, "insight generation");
        }

        let narrative = self
            .synthesizer
            .insights(&ctx.symbols, AnalysisView::of(ctx))
            .await;
        let (text, error) = narrative.into_parts();
        ctx.insights = Some(text);

        match error {
            Some(e) => {
                ctx.push_error(None, &e, format!("Error generating insights: {e}"));
                StageResult::Partial { failed: 1 }
            }
            None => {
                ctx.push_message("Insights generated successfully");
                StageResult::Completed
            }
        }
    }
}

/// Chart per collected symbol
pub struct VisualizationStage {
    renderer: Arc<dyn ChartRenderer>,
    timeout: Duration,
    parallel: bool,
}

impl VisualizationStage {
    pub fn new(renderer: Arc<dyn ChartRenderer>, timeout: Duration, parallel: bool) -> Self {
        Self {
            renderer,
            timeout,
            parallel,
        }
    }
}

#[async_trait]
impl PipelineStage for VisualizationStage {
    fn stage(&self) -> Stage {
        Stage::CreateVisualizations
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> StageResult {
        if ctx.raw_data.is_empty() {
            return skip(ctx, "visualization");
        }

        let results = {
            let view: &AnalysisContext = &*ctx;
            fan_out(&view.raw_data, self.parallel, move |(symbol, snapshot)| {
                let technical = view.technical.get(symbol);
                async move {
                    let render = self.renderer.render(symbol, &snapshot.series, technical);
                    let result = bounded(self.timeout, render, |limit| {
                        let reason = format!("timed out after {limit:?}");
                        AnalysisError::render(symbol.as_str(), reason)
                    })
                    .await;
                    (symbol.clone(), result)
                }
            })
            .await
        };

        let mut created = 0;
        let mut failed = 0;
        for (symbol, result) in results {
            match result {
                Ok(path) => {
                    info!(symbol = %symbol, path = %path.display(), "chart created");
                    ctx.chart_paths.push(path);
                    created += 1;
                }
                Err(e) => {
                    failed += 1;
                    warn!(symbol = %symbol, error = %e, "chart creation failed");
                    ctx.push_error(
                        Some(&symbol),
                        &e,
                        format!("Error creating chart for {symbol}: {e}"),
                    );
                }
            }
        }

        ctx.push_message(format!("Created {created} visualizations"));
        StageResult::from_failures(failed)
    }
}

/// One aggregate recommendations call over the full analysis
pub struct RecommendationsStage {
    synthesizer: Arc<NarrativeSynthesizer>,
}

impl RecommendationsStage {
    pub fn new(synthesizer: Arc<NarrativeSynthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl PipelineStage for RecommendationsStage {
    fn stage(&self) -> Stage {
        Stage::GenerateRecommendations
    }

    async fn run(&self, ctx: &mut AnalysisContext) -> StageResult {
        if ctx.raw_data.is_empty() {
            return skip(ctx, "recommendation generation");
        }

        let narrative = self
            .synthesizer
            .recommendations(&ctx.symbols, ctx.analysis_type, AnalysisView::of(ctx))
            .await;
        let (text, error) = narrative.into_parts();
        ctx.recommendations = vec![text];

        match error {
            Some(e) => {
                ctx.push_error(None, &e, format!("Error generating recommendations: {e}"));
                StageResult::Partial { failed: 1 }
            }
            None => {
                ctx.push_message("Investment recommendations generated");
                StageResult::Completed
            }
        }
    }
}
