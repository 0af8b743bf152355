//! Planner configuration

use crate::error::ConfigError;
use crate::oracle::{GenerationOverrides, GenerationParams};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the requirement planning pipeline
///
/// A stage table in TOML only overrides the keys it names; the rest keep
/// that stage's preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PlannerConfigFile")]
pub struct PlannerConfig {
    /// Inputs longer than this (in oracle tokens) are summarized first
    pub summarize_threshold_tokens: usize,

    /// `problem_summary` length cap for the extraction fallback
    pub max_summary_chars: usize,

    pub summary_params: GenerationParams,

    pub extraction_params: GenerationParams,

    pub plan_params: GenerationParams,

    pub expansion_params: GenerationParams,

    /// First attempt of the free-form advisor
    pub advice_params: GenerationParams,

    /// Retry policy for the JSON-producing stages
    pub retry: RetryPolicy,

    /// Retry policy for the free-form advisor
    pub advice_retry: RetryPolicy,
}

/// On-disk shape of [`PlannerConfig`]: every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlannerConfigFile {
    summarize_threshold_tokens: Option<usize>,
    max_summary_chars: Option<usize>,
    summary_params: GenerationOverrides,
    extraction_params: GenerationOverrides,
    plan_params: GenerationOverrides,
    expansion_params: GenerationOverrides,
    advice_params: GenerationOverrides,
    retry: Option<RetryPolicy>,
    advice_retry: Option<RetryPolicy>,
}

impl From<PlannerConfigFile> for PlannerConfig {
    fn from(file: PlannerConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            summarize_threshold_tokens: file
                .summarize_threshold_tokens
                .unwrap_or(defaults.summarize_threshold_tokens),
            max_summary_chars: file.max_summary_chars.unwrap_or(defaults.max_summary_chars),
            summary_params: file.summary_params.apply(defaults.summary_params),
            extraction_params: file.extraction_params.apply(defaults.extraction_params),
            plan_params: file.plan_params.apply(defaults.plan_params),
            expansion_params: file.expansion_params.apply(defaults.expansion_params),
            advice_params: file.advice_params.apply(defaults.advice_params),
            retry: file.retry.unwrap_or(defaults.retry),
            advice_retry: file.advice_retry.unwrap_or(defaults.advice_retry),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            summarize_threshold_tokens: 900,
            max_summary_chars: 1000,
            summary_params: GenerationParams::summary(),
            extraction_params: GenerationParams::extraction(),
            plan_params: GenerationParams::plan(),
            expansion_params: GenerationParams::expansion(),
            advice_params: GenerationParams::advice(),
            retry: RetryPolicy::default(),
            advice_retry: RetryPolicy::default(),
        }
    }
}

impl PlannerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summarize_threshold(mut self, tokens: usize) -> Self {
        self.summarize_threshold_tokens = tokens;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_advice_retry(mut self, retry: RetryPolicy) -> Self {
        self.advice_retry = retry;
        self
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_summary_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_summary_chars".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        for (field, params) in [
            ("summary_params", &self.summary_params),
            ("extraction_params", &self.extraction_params),
            ("plan_params", &self.plan_params),
            ("expansion_params", &self.expansion_params),
            ("advice_params", &self.advice_params),
        ] {
            if params.max_new_tokens == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.max_new_tokens", field),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }
}
