//! Run configuration for the analysis pipeline

use analyst_core::{AnalysisError, Interval, Period, Result};
use analyst_utils::{env_flag, env_or, env_parse};
use std::path::PathBuf;
use std::time::Duration;

/// Settings shared by every stage of a run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model name passed to the LLM provider
    pub model: String,

    /// Sampling temperature for narrative calls
    pub temperature: f32,

    /// Max tokens per narrative completion
    pub max_tokens: usize,

    /// Bound on one market-data fetch
    pub fetch_timeout: Duration,

    /// Bound on one text generation
    pub generation_timeout: Duration,

    /// Bound on one chart render
    pub render_timeout: Duration,

    pub default_period: Period,
    pub default_interval: Interval,

    /// Where charts are written
    pub chart_dir: PathBuf,

    /// Fan out per-symbol work within a stage
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.1,
            max_tokens: 2048,
            fetch_timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(120),
            render_timeout: Duration::from_secs(30),
            default_period: Period::OneYear,
            default_interval: Interval::OneDay,
            chart_dir: PathBuf::from("charts"),
            parallel: false,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Defaults overridden by `DEFAULT_MODEL`, `DEFAULT_PERIOD`,
    /// `DEFAULT_INTERVAL`, `CHART_OUTPUT_DIR` and `ANALYST_PARALLEL`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            model: env_or("DEFAULT_MODEL", &defaults.model),
            default_period: env_parse::<Period>("DEFAULT_PERIOD")
                .map_err(AnalysisError::Config)?
                .unwrap_or(defaults.default_period),
            default_interval: env_parse::<Interval>("DEFAULT_INTERVAL")
                .map_err(AnalysisError::Config)?
                .unwrap_or(defaults.default_interval),
            chart_dir: PathBuf::from(env_or("CHART_OUTPUT_DIR", "charts")),
            parallel: env_flag("ANALYST_PARALLEL"),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AnalysisError::Config("model must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AnalysisError::Config(format!(
                "temperature must be in [0, 2], got {}",
                self.temperature
            )));
        }

        if self.max_tokens == 0 {
            return Err(AnalysisError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.fetch_timeout.is_zero()
            || self.generation_timeout.is_zero()
            || self.render_timeout.is_zero()
        {
            return Err(AnalysisError::Config("timeouts must be non-zero".to_string()));
        }

        if self.chart_dir.as_os_str().is_empty() {
            return Err(AnalysisError::Config(
                "chart_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for PipelineConfig
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    fetch_timeout: Option<Duration>,
    generation_timeout: Option<Duration>,
    render_timeout: Option<Duration>,
    default_period: Option<Period>,
    default_interval: Option<Interval>,
    chart_dir: Option<PathBuf>,
    parallel: Option<bool>,
}

impl PipelineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = Some(timeout);
        self
    }

    pub fn render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = Some(timeout);
        self
    }

    pub fn default_period(mut self, period: Period) -> Self {
        self.default_period = Some(period);
        self
    }

    pub fn default_interval(mut self, interval: Interval) -> Self {
        self.default_interval = Some(interval);
        self
    }

    pub fn chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chart_dir = Some(dir.into());
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            model: self.model.unwrap_or(defaults.model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            fetch_timeout: self.fetch_timeout.unwrap_or(defaults.fetch_timeout),
            generation_timeout: self
                .generation_timeout
                .unwrap_or(defaults.generation_timeout),
            render_timeout: self.render_timeout.unwrap_or(defaults.render_timeout),
            default_period: self.default_period.unwrap_or(defaults.default_period),
            default_interval: self.default_interval.unwrap_or(defaults.default_interval),
            chart_dir: self.chart_dir.unwrap_or(defaults.chart_dir),
            parallel: self.parallel.unwrap_or(defaults.parallel),
        };

        config.validate()?;
        Ok(config)
    }
}
