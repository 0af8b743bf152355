//! Oracle abstraction - the text-generation capability the pipeline consumes
//!
//! The pipeline never talks to a model directly. It receives an explicitly
//! constructed [`TextGenerator`] and a [`TokenCounter`], both owned by the
//! process entry point and shared behind `Arc`.

use crate::error::OracleError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Generation parameters passed with every oracle call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Upper bound on generated tokens
    pub max_new_tokens: u32,

    /// Beam count (1 disables beam search)
    pub num_beams: u32,

    /// Enable sampling; when false decoding is greedy/beam and temperature is ignored
    pub sample: bool,

    pub temperature: f64,

    pub top_p: f64,

    pub repetition_penalty: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 256,
            num_beams: 4,
            sample: true,
            temperature: 0.7,
            top_p: 0.95,
            repetition_penalty: 1.6,
        }
    }
}

impl GenerationParams {
    /// One-paragraph summary of an over-long problem description
    pub fn summary() -> Self {
        Self {
            max_new_tokens: 256,
            num_beams: 4,
            sample: false,
            temperature: 0.3,
            ..Self::default()
        }
    }

    /// Deterministic requirement extraction
    pub fn extraction() -> Self {
        Self {
            max_new_tokens: 250,
            num_beams: 4,
            sample: false,
            temperature: 0.0,
            ..Self::default()
        }
    }

    /// Plan generation needs room for several structured steps
    pub fn plan() -> Self {
        Self {
            max_new_tokens: 512,
            num_beams: 5,
            sample: true,
            temperature: 0.45,
            ..Self::default()
        }
    }

    /// Per-step expansion
    pub fn expansion() -> Self {
        Self {
            max_new_tokens: 400,
            num_beams: 4,
            sample: true,
            temperature: 0.7,
            ..Self::default()
        }
    }

    /// Free-form advice, beam search first
    pub fn advice() -> Self {
        Self {
            max_new_tokens: 650,
            num_beams: 5,
            sample: false,
            temperature: 0.7,
            repetition_penalty: 1.2,
            ..Self::default()
        }
    }

    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    pub fn with_num_beams(mut self, num_beams: u32) -> Self {
        self.num_beams = num_beams;
        self
    }

    pub fn with_sampling(mut self, sample: bool) -> Self {
        self.sample = sample;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_repetition_penalty(mut self, repetition_penalty: f64) -> Self {
        self.repetition_penalty = repetition_penalty;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }
}

/// Partial [`GenerationParams`] as written in a config file.
///
/// Keys left out keep the value of the stage preset the overrides are applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationOverrides {
    pub max_new_tokens: Option<u32>,
    pub num_beams: Option<u32>,
    pub sample: Option<bool>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub repetition_penalty: Option<f64>,
}

impl GenerationOverrides {
    pub fn apply(&self, base: GenerationParams) -> GenerationParams {
        let mut params = base;
        if let Some(max_new_tokens) = self.max_new_tokens {
            params = params.with_max_new_tokens(max_new_tokens);
        }
        if let Some(num_beams) = self.num_beams {
            params = params.with_num_beams(num_beams);
        }
        if let Some(sample) = self.sample {
            params = params.with_sampling(sample);
        }
        if let Some(temperature) = self.temperature {
            params = params.with_temperature(temperature);
        }
        if let Some(top_p) = self.top_p {
            params = params.with_top_p(top_p);
        }
        if let Some(repetition_penalty) = self.repetition_penalty {
            params = params.with_repetition_penalty(repetition_penalty);
        }
        params
    }
}

/// Text-generation oracle: prompt in, decoded text out
///
/// Implementations may fail or return garbled text; callers treat the output
/// as untrusted.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Oracle name, used in logs
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str, params: &GenerationParams)
        -> Result<String, OracleError>;
}

#[async_trait::async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, OracleError> {
        (**self).generate(prompt, params).await
    }
}

/// Model-specific token length of a text
pub trait TokenCounter: Send + Sync + std::fmt::Debug {
    fn token_count(&self, text: &str) -> usize;
}

/// Counts whitespace-separated words.
///
/// Subword tokenizers produce more tokens than words, so this underestimates;
/// it is the fallback when no model tokenizer is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn token_count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Funnels every call through a single lock so at most one generation runs at
/// a time.
///
/// Local model backends are not safe for concurrent invocation; wrap them in
/// this before sharing them between requests.
#[derive(Debug)]
pub struct SerializedGenerator<G> {
    inner: G,
    lock: Mutex<()>,
}

impl<G: TextGenerator> SerializedGenerator<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }

    pub fn into_inner(self) -> G {
        self.inner
    }
}

#[async_trait::async_trait]
impl<G: TextGenerator> TextGenerator for SerializedGenerator<G> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, OracleError> {
        let _guard = self.lock.lock().await;
        self.inner.generate(prompt, params).await
    }
}
