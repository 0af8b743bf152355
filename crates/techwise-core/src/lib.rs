//! TechWISE Core - requirement planning over an unreliable text oracle
//!
//! Turns a free-text IT problem description into a structured, prioritized
//! and expanded troubleshooting plan. Every stage talks to a generative model
//! through the [`TextGenerator`] trait and treats its output as untrusted.
//!
//! # Architecture
//!
//! 1. **Requirement extraction** (`requirements`): optional summarization of
//!    long input, then a fixed ten-field JSON record
//! 2. **Plan generation** (`plan`): prioritized steps, safest first
//! 3. **Step expansion** (`expand`): one detailed guide per step, order kept
//! 4. **Report** (`report`): plain-text rendering of the whole result
//!
//! Each stage is a total function. Malformed model output goes through
//! `json_repair`, then a bounded `retry` policy, then a deterministic
//! fallback, so [`RequirementPlanner::plan_and_generate`] always returns a
//! complete [`PlanningResult`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use techwise_core::{
//!     PlannerConfig, RequirementPlanner, SerializedGenerator, TextGenerator,
//!     WhitespaceTokenCounter,
//! };
//!
//! # async fn run(backend: impl TextGenerator + 'static) {
//! let oracle = Arc::new(SerializedGenerator::new(backend));
//! let planner = RequirementPlanner::new(
//!     oracle,
//!     Arc::new(WhitespaceTokenCounter),
//!     PlannerConfig::default(),
//! );
//!
//! let result = planner
//!     .plan_and_generate("My laptop Wi-Fi drops every time it wakes from sleep")
//!     .await;
//! println!("{}", techwise_core::report::to_human_report(&result));
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, clippy::all)]

pub mod advisor;
pub mod config;
pub mod error;
pub mod expand;
pub mod input;
pub mod json_repair;
pub mod oracle;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod requirements;
pub mod retry;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for convenience
pub use advisor::{AdviceQualityGate, Advisor};
pub use config::PlannerConfig;
pub use error::{ConfigError, InputError, OracleError};
pub use expand::StepExpander;
pub use oracle::{
    GenerationOverrides, GenerationParams, SerializedGenerator, TextGenerator, TokenCounter,
    WhitespaceTokenCounter,
};
pub use orchestrator::RequirementPlanner;
pub use plan::PlanGenerator;
pub use requirements::RequirementExtractor;
pub use retry::{QualityGate, RetryPolicy};
pub use types::{ExpandedStep, Plan, PlanningResult, Requirements, Step};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
