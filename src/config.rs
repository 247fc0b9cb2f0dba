use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Connection settings for the judging LLM
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmSettings {
    /// Literal API key; takes precedence over `env_var_api_key`
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable name containing the API key
    #[serde(default = "default_env_var_api_key")]
    pub env_var_api_key: String,
    /// Model used to judge summaries
    pub model: String,
    /// OpenAI-compatible API endpoint
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// Sampling temperature for judging (kept low for repeatable scores)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on a single provider call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl LlmSettings {
    /// Resolve the API key from the config file or the environment
    pub fn resolve_api_key(&self) -> Result<String> {
        match &self.api_key {
            Some(key) if !key.trim().is_empty() => Ok(key.clone()),
            _ => std::env::var(&self.env_var_api_key)
                .with_context(|| format!("Environment variable {} not found", self.env_var_api_key)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_env_var_api_key() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_api_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// One axis of summary quality and the prompt used to judge it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationParameterConfig {
    /// Identifier; filled from the map key when omitted
    #[serde(default)]
    pub name: String,
    pub description: String,
    /// Template with `{transcript}` and `{summary}` slots
    pub prompt_template: String,
}

/// Input size limits applied before any LLM call
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreprocessingConfig {
    #[serde(default = "default_max_transcript_length")]
    pub max_transcript_length: usize,
    #[serde(default = "default_max_summary_length")]
    pub max_summary_length: usize,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            max_transcript_length: default_max_transcript_length(),
            max_summary_length: default_max_summary_length(),
        }
    }
}

fn default_max_transcript_length() -> usize {
    50_000
}

fn default_max_summary_length() -> usize {
    5_000
}

/// Retry settings for a single parameter evaluation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

/// Root configuration, loaded once at startup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub llm: LlmSettings,
    /// Known parameters, keyed by name
    pub evaluation_parameters: IndexMap<String, EvaluationParameterConfig>,
    /// Weight per parameter name; absent or zero means unweighted
    #[serde(default)]
    pub scoring_weights: IndexMap<String, f64>,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(content)?;

        for (key, parameter) in config.evaluation_parameters.iter_mut() {
            if parameter.name.is_empty() {
                parameter.name = key.clone();
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (key, parameter) in &self.evaluation_parameters {
            if !parameter.prompt_template.contains("{transcript}")
                || !parameter.prompt_template.contains("{summary}")
            {
                bail!("Prompt template for '{key}' must contain {{transcript}} and {{summary}}");
            }
        }

        for (key, weight) in &self.scoring_weights {
            if !weight.is_finite() || *weight < 0.0 {
                bail!("Scoring weight for '{key}' must be a non-negative number, got {weight}");
            }
        }

        if self.llm.request_timeout_secs == 0 {
            bail!("llm.request_timeout_secs must be at least 1");
        }

        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }

        Ok(())
    }
}
