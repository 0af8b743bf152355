//! TechWISE Gateway - HTTP front end
//!
//! Serves the requirement planner and the free-form advisor over HTTP.
//!
//! # Routes
//!
//! ```text
//! GET  /        HTML form
//! GET  /health  liveness probe
//! POST /plan    {"question"}            -> requirements, plan, expanded steps, report
//! POST /ask     {"question", "context"} -> advisor answer
//! ```
//!
//! The oracle is wrapped in a `SerializedGenerator`, so concurrent requests
//! queue for it instead of running generations in parallel.

pub mod config;
pub mod error;
pub mod gateway;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{AskRequest, AskResponse, Gateway, GatewayState, PlanRequest, PlanResponse};

/// Gateway version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Default host
pub const DEFAULT_HOST: &str = "127.0.0.1";
