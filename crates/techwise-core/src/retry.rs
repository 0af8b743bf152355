//! Bounded retry over an unreliable oracle
//!
//! Every oracle-calling stage has the same shape: generate, validate the
//! output, and on failure retry once with an adjusted prompt and parameters
//! before the caller substitutes its deterministic fallback.

use crate::oracle::{GenerationParams, TextGenerator};
use serde::{Deserialize, Serialize};

/// Predicate deciding whether a free-text generation is usable
pub trait QualityGate: Send + Sync {
    fn passes(&self, output: &str) -> bool;
}

/// How many attempts to make and how to adjust parameters between them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first (minimum 1)
    pub max_attempts: u32,

    /// Added to the temperature on each retry, capped at 1.0
    pub temperature_step: f64,

    /// Added to the output budget on each retry
    pub extra_tokens: u32,

    /// Added to the repetition penalty on each retry
    pub repetition_penalty_step: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            temperature_step: 0.2,
            extra_tokens: 100,
            repetition_penalty_step: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retry
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Parameters for the next attempt.
    ///
    /// Retries switch to plain sampling so the oracle does not reproduce the
    /// rejected beam-search output.
    pub fn adjust(&self, params: &GenerationParams) -> GenerationParams {
        GenerationParams {
            max_new_tokens: params.max_new_tokens.saturating_add(self.extra_tokens),
            num_beams: 1,
            sample: true,
            temperature: (params.temperature + self.temperature_step).clamp(0.1, 1.0),
            top_p: params.top_p,
            repetition_penalty: params.repetition_penalty + self.repetition_penalty_step,
        }
    }

    /// Run `oracle` until `validate` accepts an output or attempts run out.
    ///
    /// Retries append `reprompt` to the prompt. Oracle errors count as failed
    /// attempts; non-retryable errors stop immediately. Returns `None` when no
    /// attempt was accepted.
    pub async fn run<T, F>(
        &self,
        oracle: &dyn TextGenerator,
        stage: &str,
        prompt: &str,
        params: &GenerationParams,
        reprompt: &str,
        validate: F,
    ) -> Option<T>
    where
        F: Fn(&str) -> Option<T>,
    {
        let attempts = self.max_attempts.max(1);
        let mut current_prompt = prompt.to_string();
        let mut current_params = *params;

        for attempt in 1..=attempts {
            tracing::debug!(
                "{}: attempt {}/{} via {} ({} prompt chars)",
                stage,
                attempt,
                attempts,
                oracle.name(),
                current_prompt.len()
            );

            match oracle.generate(&current_prompt, &current_params).await {
                Ok(raw) => {
                    tracing::debug!("{}: oracle returned {} chars", stage, raw.len());
                    if let Some(accepted) = validate(&raw) {
                        return Some(accepted);
                    }
                    tracing::warn!("{}: attempt {} rejected by validation", stage, attempt);
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!("{}: attempt {} failed: {}", stage, attempt, e);
                }
                Err(e) => {
                    tracing::warn!("{}: giving up after non-retryable error: {}", stage, e);
                    return None;
                }
            }

            if attempt < attempts {
                current_prompt = format!("{}{}", prompt, reprompt);
                current_params = self.adjust(&current_params);
            }
        }

        None
    }
}
