use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use techwise_core::input::validate_query;
use techwise_core::report::to_human_report;
use techwise_core::{Advisor, PlannerConfig, RequirementPlanner, TextGenerator, TokenCounter};
use techwise_gateway::{Gateway, GatewayConfig, GatewayState};
use techwise_providers::{build_backends, OracleConfig, ProviderConfig};
use tracing_subscriber::EnvFilter;

/// TechWISE - turn IT problem descriptions into troubleshooting plans
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Provider settings (oracle endpoint, tokenizer) in TOML
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Planner tunables in TOML
    #[arg(long, value_name = "FILE", global = true)]
    planner_config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract requirements, build a plan and expand every step
    Plan {
        /// Problem description
        text: Option<String>,

        /// Read the problem description from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Print the raw result as JSON instead of the report
        #[arg(long)]
        json: bool,
    },

    /// Free-form project advice
    Advise {
        question: String,

        /// Background to include in the prompt
        #[arg(long, default_value = "")]
        context: String,
    },

    /// Start the HTTP gateway
    Serve {
        #[arg(short, long, default_value = "5000")]
        port: u16,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let planner_config = match &cli.planner_config {
        Some(path) => PlannerConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load planner config {}", path.display()))?,
        None => PlannerConfig::default(),
    };
    let (oracle, tokens) = backends(cli.config.as_deref())?;
    tracing::debug!("Oracle {} ready", oracle.name());

    match cli.command {
        Commands::Plan { text, file, json } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => bail!("Provide a problem description or --file"),
            };
            let question = validate_query(&text, GatewayConfig::default().min_query_chars)?;
            tracing::info!("Planning for a {}-character problem description", question.len());

            let planner = RequirementPlanner::new(oracle, tokens, planner_config);
            let result = planner.plan_and_generate(question).await;
            tracing::debug!(
                "Plan has {} steps, confidence {}",
                result.plan.steps.len(),
                result.plan.confidence
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", to_human_report(&result));
            }
        }
        Commands::Advise { question, context } => {
            let question = validate_query(&question, GatewayConfig::default().min_query_chars)?;
            tracing::info!("Generating advice for: {}", question);
            let advice = Advisor::new(oracle, planner_config)
                .generate_advice(question, &context)
                .await;
            println!("{}", advice);
        }
        Commands::Serve { port, host } => {
            let config = GatewayConfig::default().with_host(host).with_port(port);
            tracing::info!("Serving on {}:{}", config.host, config.port);
            let gateway = Gateway::new(GatewayState::new(config, oracle, tokens, planner_config));
            gateway.start().await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so `plan --json` output stays machine-readable
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn backends(
    config: Option<&std::path::Path>,
) -> anyhow::Result<(Arc<dyn TextGenerator>, Arc<dyn TokenCounter>)> {
    let providers = match config {
        Some(path) => ProviderConfig::load(path)?,
        None => ProviderConfig {
            oracle: OracleConfig::default().apply_env(),
            ..ProviderConfig::default()
        },
    };
    build_backends(&providers)
}
