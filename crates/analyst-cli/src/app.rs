//! Wiring the capabilities together and running one analysis request

use crate::output;
use analyst_core::{AnalysisSummary, AnalysisType, Interval, Period, Stage};
use analyst_llm::LLMProvider;
use analyst_llm::providers::{AnthropicProvider, OpenAIProvider};
use analyst_llm::{ProviderGenerator, TextGenerator};
use analyst_market::{CachedMarketData, MarketDataProvider, MarketDataService};
use analyst_report::{Audience, ReportType, ReportWriter};
use analyst_utils::env_or;
use analyst_workflow::{AnalysisPipeline, PipelineConfig, PipelineOutcome};
use anyhow::{Context, bail};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

const REPORT_TEMPERATURE: f32 = 0.2;

/// One analysis to run
#[derive(Debug, Clone)]
pub struct Request {
    pub symbols: Vec<String>,
    pub analysis_type: AnalysisType,
    pub period: Option<Period>,
    pub interval: Option<Interval>,
    pub report_type: ReportType,
    pub audience: Audience,
    pub write_report: bool,
    pub save: bool,
}

/// What a request produced
#[derive(Debug)]
pub struct RunOutput {
    pub summary: AnalysisSummary,
    /// Stage that never started because the run was interrupted
    pub cancelled_at: Option<Stage>,
    pub report_text: Option<String>,
    pub report_path: Option<PathBuf>,
    pub analysis_path: Option<PathBuf>,
}

pub struct App {
    pipeline: AnalysisPipeline,
    writer: ReportWriter,
    report_dir: PathBuf,
}

impl App {
    /// Build providers and the pipeline from the environment
    pub fn from_env(parallel: bool) -> anyhow::Result<Self> {
        let mut config = PipelineConfig::from_env().context("invalid pipeline configuration")?;
        config.parallel = config.parallel || parallel;

        let provider = llm_provider()?;
        let generator: Arc<dyn TextGenerator> = Arc::new(
            ProviderGenerator::new(provider.clone(), config.model.clone())
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens),
        );
        let report_generator: Arc<dyn TextGenerator> = Arc::new(
            ProviderGenerator::new(provider, config.model.clone())
                .with_temperature(REPORT_TEMPERATURE)
                .with_max_tokens(config.max_tokens),
        );

        let service = MarketDataService::from_env().context("invalid market data configuration")?;
        let market_config = service.config().clone();
        let market: Arc<dyn MarketDataProvider> = if market_config.enable_cache {
            Arc::new(CachedMarketData::from_config(service, &market_config))
        } else {
            Arc::new(service)
        };

        let writer = ReportWriter::new(report_generator, config.generation_timeout)
            .context("failed to load report templates")?;

        let pipeline = AnalysisPipeline::builder()
            .market(market)
            .generator(generator)
            .config(config)
            .build()
            .context("failed to build analysis pipeline")?;

        Ok(Self {
            pipeline,
            writer,
            report_dir: PathBuf::from(env_or("REPORT_OUTPUT_DIR", "reports")),
        })
    }

    pub fn pipeline(&self) -> &AnalysisPipeline {
        &self.pipeline
    }

    /// Run the pipeline and, unless interrupted, the report writer
    ///
    /// Ctrl-C stops the run before the next stage starts.
    pub async fn run(&self, request: &Request) -> anyhow::Result<RunOutput> {
        let ctx = self
            .pipeline
            .prepare(
                &request.symbols,
                request.analysis_type,
                request.period,
                request.interval,
            )
            .context("invalid analysis request")?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping after the current stage");
                let _ = cancel_tx.send(true);
            }
        });

        let outcome = self.pipeline.run_with_cancel(ctx, cancel_rx).await;
        interrupt.abort();

        let cancelled_at = match &outcome {
            PipelineOutcome::Cancelled { at, .. } => Some(*at),
            PipelineOutcome::Finished(_) => None,
        };
        let summary = outcome.into_context().summary();

        let mut output = RunOutput {
            summary,
            cancelled_at,
            report_text: None,
            report_path: None,
            analysis_path: None,
        };

        if request.write_report && cancelled_at.is_none() {
            info!("writing {} report", request.report_type);
            let report = self
                .writer
                .write(&output.summary, request.report_type, request.audience)
                .await;
            if request.save {
                output.report_path = Some(
                    report
                        .save(&self.report_dir)
                        .await
                        .context("failed to save report")?,
                );
            }
            for message in &report.messages {
                info!("{message}");
            }
            output.report_text = Some(report.compile());
        }

        if request.save {
            output.analysis_path = Some(
                output::save_analysis(&self.report_dir, &output.summary)
                    .await
                    .context("failed to save analysis results")?,
            );
        }

        Ok(output)
    }
}

/// Provider named by `ANALYST_LLM_PROVIDER` (`openai` unless set)
fn llm_provider() -> anyhow::Result<Arc<dyn LLMProvider>> {
    let name = env_or("ANALYST_LLM_PROVIDER", "openai").to_ascii_lowercase();
    match name.as_str() {
        "openai" => Ok(Arc::new(
            OpenAIProvider::from_env().context("failed to configure OpenAI provider")?,
        )),
        "anthropic" => Ok(Arc::new(
            AnthropicProvider::from_env().context("failed to configure Anthropic provider")?,
        )),
        other => bail!("unknown LLM provider '{other}' (expected openai or anthropic)"),
    }
}
