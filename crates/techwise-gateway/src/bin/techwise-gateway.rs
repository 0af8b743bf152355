//! TechWISE Gateway Binary
//!
//! # Usage
//! ```bash
//! techwise-gateway [--port 5000] [--host 127.0.0.1] [--config techwise.toml] [--verbose]
//! ```

use anyhow::Context;
use clap::Parser;
use techwise_core::PlannerConfig;
use techwise_gateway::{Gateway, GatewayConfig, GatewayState};
use techwise_providers::{build_backends, OracleConfig, ProviderConfig};
use tracing_subscriber::EnvFilter;

/// TechWISE Gateway - requirement planner and advisor over HTTP
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Provider settings (oracle endpoint, tokenizer) in TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Planner tunables in TOML
    #[arg(long)]
    planner_config: Option<String>,

    /// Minimum question length in characters
    #[arg(long, default_value = "3")]
    min_query_chars: usize,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(args.verbose)
        .init();

    let providers = match &args.config {
        Some(path) => ProviderConfig::load(path)?,
        None => ProviderConfig {
            oracle: OracleConfig::default().apply_env(),
            ..ProviderConfig::default()
        },
    };

    let planner_config = match &args.planner_config {
        Some(path) => PlannerConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load planner config {}", path))?,
        None => PlannerConfig::default(),
    };

    let (oracle, tokens) = build_backends(&providers)?;

    let config = GatewayConfig::default()
        .with_host(args.host.clone())
        .with_port(args.port)
        .with_min_query_chars(args.min_query_chars);

    print_banner(&args.host, args.port);

    let gateway = Gateway::new(GatewayState::new(config, oracle, tokens, planner_config));
    gateway.start().await?;

    Ok(())
}

fn print_banner(host: &str, port: u16) {
    println!();
    println!("TechWISE Gateway v{}", techwise_gateway::VERSION);
    println!("   └─ http://{}:{}", host, port);
    println!();
    println!("HTTP Endpoints");
    println!("   ├─ GET  /         Question form");
    println!("   ├─ GET  /health   Health check");
    println!("   ├─ POST /plan     Troubleshooting plan");
    println!("   └─ POST /ask      Project advice");
    println!();
    println!("Press Ctrl+C to stop the gateway");
    println!();
}
