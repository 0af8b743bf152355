//! Model tokenizer for the summarization threshold
//!
//! The threshold is expressed in model tokens, so counting uses the oracle's
//! own vocabulary when one can be loaded. Loading is best effort: without a
//! tokenizer the pipeline still runs on a word count.

use anyhow::{Error as E, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::Path;
use std::sync::Arc;
use techwise_core::{TokenCounter, WhitespaceTokenCounter};
use tokenizers::Tokenizer;

use crate::config::TokenizerConfig;

/// Token counter backed by a Hugging Face `tokenizer.json`
pub struct HfTokenCounter {
    tokenizer: Tokenizer,
    source: String,
}

impl std::fmt::Debug for HfTokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfTokenCounter")
            .field("source", &self.source)
            .finish()
    }
}

impl HfTokenCounter {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path).map_err(E::msg)?;
        Ok(Self {
            tokenizer,
            source: path.display().to_string(),
        })
    }

    /// Download (or reuse the cached) `tokenizer.json` of a model repo
    pub fn from_hub(repo_id: &str) -> Result<Self> {
        let api = Api::new()?;
        let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));
        let tokenizer_filename = repo.get("tokenizer.json")?;
        let tokenizer = Tokenizer::from_file(tokenizer_filename).map_err(E::msg)?;
        Ok(Self {
            tokenizer,
            source: repo_id.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl TokenCounter for HfTokenCounter {
    fn token_count(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.len(),
            Err(e) => {
                tracing::warn!("Tokenization failed, counting words: {}", e);
                WhitespaceTokenCounter.token_count(text)
            }
        }
    }
}

/// Build the counter described by `config`, falling back to word counting
pub fn load_token_counter(config: &TokenizerConfig) -> Arc<dyn TokenCounter> {
    let loaded = if let Some(path) = &config.path {
        Some(HfTokenCounter::from_file(path))
    } else {
        config.hf_repo.as_deref().map(HfTokenCounter::from_hub)
    };

    match loaded {
        Some(Ok(counter)) => {
            tracing::info!("Loaded tokenizer from {}", counter.source());
            Arc::new(counter)
        }
        Some(Err(e)) => {
            tracing::warn!("Tokenizer unavailable ({}), counting words instead", e);
            Arc::new(WhitespaceTokenCounter)
        }
        None => Arc::new(WhitespaceTokenCounter),
    }
}
