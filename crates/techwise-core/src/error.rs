//! Error types for TechWISE Core
//!
//! The planning pipeline itself never returns an error: every stage degrades
//! to a deterministic fallback. These types describe failures at the edges,
//! the oracle, user input and configuration loading.

use thiserror::Error;

/// Failures reported by a text-generation oracle
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    /// Out of memory, rate limited or otherwise overloaded
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Oracle returned an empty response")]
    EmptyResponse,
}

impl OracleError {
    /// Whether another attempt has a chance of succeeding.
    ///
    /// Resource exhaustion is not retried: a second generation would hit the
    /// same limit.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, OracleError::ResourceExhausted(_))
    }
}

/// Degenerate user input, rejected before the pipeline runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter your IT-related question.")]
    Empty,

    #[error("Please describe the problem in more detail (at least {min} characters, got {actual}).")]
    TooShort { min: usize, actual: usize },
}

/// Errors related to configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
