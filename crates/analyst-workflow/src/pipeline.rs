//! Pipeline assembly and execution

use crate::config::PipelineConfig;
use crate::stages::{
    DataCollectionStage, FundamentalStage, InsightsStage, PipelineStage, RecommendationsStage,
    SentimentStage, TechnicalStage, VisualizationStage,
};
use analyst_core::{
    AnalysisContext, AnalysisError, AnalysisType, Interval, Period, Result, Stage, StageReport,
    Symbol,
};
use analyst_engine::{ChartRenderer, JsonChartRenderer, NarrativeSynthesizer};
use analyst_llm::TextGenerator;
use analyst_market::MarketDataProvider;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{Instrument, info, info_span, instrument, warn};

/// How a run ended
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Every stage ran; the context is at [`Stage::Done`]
    Finished(AnalysisContext),
    /// Cancellation was observed before `at` started
    Cancelled { context: AnalysisContext, at: Stage },
}

impl PipelineOutcome {
    pub fn context(&self) -> &AnalysisContext {
        match self {
            PipelineOutcome::Finished(context) | PipelineOutcome::Cancelled { context, .. } => {
                context
            }
        }
    }

    /// The context, finished or partial
    pub fn into_context(self) -> AnalysisContext {
        match self {
            PipelineOutcome::Finished(context) | PipelineOutcome::Cancelled { context, .. } => {
                context
            }
        }
    }

    /// The finished context, or [`AnalysisError::Cancelled`]
    pub fn into_result(self) -> Result<AnalysisContext> {
        match self {
            PipelineOutcome::Finished(context) => Ok(context),
            PipelineOutcome::Cancelled { at, .. } => {
                Err(AnalysisError::Cancelled(format!("run cancelled before {at}")))
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineOutcome::Cancelled { .. })
    }
}

/// The ordered stage sequence plus its configuration
///
/// One pipeline can serve many runs; each run gets its own [`AnalysisContext`].
///
/// # Example
///
/// ```no_run
/// use analyst_core::AnalysisType;
/// use analyst_workflow::AnalysisPipeline;
/// # use std::sync::Arc;
///
/// # async fn example(
/// #     market: Arc<dyn analyst_market::MarketDataProvider>,
/// #     generator: Arc<dyn analyst_llm::TextGenerator>,
/// # ) -> analyst_core::Result<()> {
/// let pipeline = AnalysisPipeline::builder()
///     .market(market)
///     .generator(generator)
///     .build()?;
///
/// let ctx = pipeline
///     .analyze(&["AAPL", "MSFT"], AnalysisType::Comparison, None, None)
///     .await?;
/// println!("{}", ctx.insights.unwrap_or_default());
/// # Ok(())
/// # }
/// ```
pub struct AnalysisPipeline {
    stages: Vec<Box<dyn PipelineStage>>,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stage identifiers in execution order
    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.stages.iter().map(|s| s.stage())
    }

    /// Validate inputs and create the context for a run
    ///
    /// Period and interval fall back to the configured defaults.
    pub fn prepare<S: AsRef<str>>(
        &self,
        symbols: &[S],
        analysis_type: AnalysisType,
        period: Option<Period>,
        interval: Option<Interval>,
    ) -> Result<AnalysisContext> {
        let symbols = Symbol::parse_many(symbols)?;
        AnalysisContext::new(
            symbols,
            analysis_type,
            period.unwrap_or(self.config.default_period),
            interval.unwrap_or(self.config.default_interval),
        )
    }

    /// Run every stage for `symbols`
    ///
    /// Only input validation can fail; stage failures are recorded on the
    /// returned context.
    pub async fn analyze<S: AsRef<str>>(
        &self,
        symbols: &[S],
        analysis_type: AnalysisType,
        period: Option<Period>,
        interval: Option<Interval>,
    ) -> Result<AnalysisContext> {
        let ctx = self.prepare(symbols, analysis_type, period, interval)?;
        Ok(self.run(ctx).await)
    }

    /// Run every stage on an existing context
    pub async fn run(&self, ctx: AnalysisContext) -> AnalysisContext {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_with_cancel(ctx, cancel_rx).await.into_context()
    }

    /// Run every stage, checking `cancel` before each one
    #[instrument(skip_all, fields(run_id = %ctx.run_id, symbols = ctx.symbols.len()))]
    pub async fn run_with_cancel(
        &self,
        mut ctx: AnalysisContext,
        cancel: watch::Receiver<bool>,
    ) -> PipelineOutcome {
        info!(
            "starting {} analysis of {:?}",
            ctx.analysis_type,
            ctx.symbols.iter().map(Symbol::as_str).collect::<Vec<_>>()
        );

        for stage in &self.stages {
            let kind = stage.stage();
            if *cancel.borrow() {
                warn!(stage = %kind, "run cancelled");
                ctx.current_stage = kind;
                return PipelineOutcome::Cancelled {
                    context: ctx,
                    at: kind,
                };
            }

            ctx.current_stage = kind;
            let started = Instant::now();
            let result = stage
                .run(&mut ctx)
                .instrument(info_span!("stage", stage = %kind))
                .await;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            info!(stage = %kind, ?result, duration_ms, "stage finished");
            ctx.stage_reports.push(StageReport {
                stage: kind,
                result,
                duration_ms,
            });
        }

        ctx.current_stage = Stage::Done;
        ctx.finished_at = Some(Utc::now());
        info!(
            errors = ctx.errors.len(),
            charts = ctx.chart_paths.len(),
            "analysis finished"
        );
        PipelineOutcome::Finished(ctx)
    }
}

/// Builder wiring the capabilities into the stage sequence
#[derive(Default)]
pub struct PipelineBuilder {
    market: Option<Arc<dyn MarketDataProvider>>,
    generator: Option<Arc<dyn TextGenerator>>,
    renderer: Option<Arc<dyn ChartRenderer>>,
    config: Option<PipelineConfig>,
}

impl PipelineBuilder {
    /// Market-data capability (required)
    pub fn market(mut self, market: Arc<dyn MarketDataProvider>) -> Self {
        self.market = Some(market);
        self
    }

    /// Text-generation capability (required)
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Chart renderer; defaults to JSON charts in the configured chart directory
    pub fn renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<AnalysisPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let market = self
            .market
            .ok_or_else(|| AnalysisError::Config("market data provider is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| AnalysisError::Config("text generator is required".to_string()))?;
        let renderer = self
            .renderer
            .unwrap_or_else(|| Arc::new(JsonChartRenderer::new(config.chart_dir.clone())));

        let synthesizer = Arc::new(NarrativeSynthesizer::new(
            generator,
            config.generation_timeout,
        )?);

        let stages: Vec<Box<dyn PipelineStage>> = vec![
            Box::new(DataCollectionStage::new(
                market,
                config.fetch_timeout,
                config.parallel,
            )),
            Box::new(TechnicalStage),
            Box::new(FundamentalStage),
            Box::new(SentimentStage::new(synthesizer.clone(), config.parallel)),
            Box::new(InsightsStage::new(synthesizer.clone())),
            Box::new(VisualizationStage::new(
                renderer,
                config.render_timeout,
                config.parallel,
            )),
            Box::new(RecommendationsStage::new(synthesizer)),
        ];

        Ok(AnalysisPipeline { stages, config })
    }
}
