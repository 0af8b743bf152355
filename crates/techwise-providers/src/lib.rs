//! TechWISE Providers - concrete oracles and tokenizers
//!
//! [`OpenAICompatibleGenerator`] implements `techwise_core::TextGenerator`
//! over HTTP; [`HfTokenCounter`] implements `TokenCounter` with a Hugging
//! Face tokenizer. Setup errors use `anyhow`; per-call failures are reported
//! as `OracleError` so the pipeline can fall back.

#![warn(rust_2018_idioms, missing_debug_implementations)]

pub mod config;
pub mod openai_compatible;
pub mod tokenizer;

pub use config::{OracleConfig, ProviderConfig, TokenizerConfig};
pub use openai_compatible::OpenAICompatibleGenerator;
pub use tokenizer::{load_token_counter, HfTokenCounter};

use std::sync::Arc;
use techwise_core::{TextGenerator, TokenCounter};

/// Oracle and token counter described by `config`
pub fn build_backends(
    config: &ProviderConfig,
) -> anyhow::Result<(Arc<dyn TextGenerator>, Arc<dyn TokenCounter>)> {
    let oracle = OpenAICompatibleGenerator::from_config(&config.oracle)?;
    tracing::info!(
        "Using oracle {} at {}",
        oracle.name(),
        config.oracle.base_url
    );
    let tokens = load_token_counter(&config.tokenizer);
    Ok((Arc::new(oracle), tokens))
}
