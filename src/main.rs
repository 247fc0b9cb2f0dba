use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod evaluation;
mod models;
mod output;
mod retry;
mod runner;
mod scoring;
mod validation;

use crate::config::Config;
use crate::evaluation::OpenAiJudge;
use crate::models::EvaluationRequest;
use crate::output::OutputFormat;
use crate::runner::Runner;

/// Summary evaluation service - score a summary against its transcript with an LLM judge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    /// Verbose output - debug level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Evaluate a single request read from a JSON file
    Evaluate {
        /// Path to a JSON document shaped like the API request body
        #[arg(short, long)]
        request: PathBuf,

        /// Output format: plain or json
        #[arg(short, long, default_value = "plain")]
        output: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!("summary-eval v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::from_file(&args.config)?);
    let judge = Arc::new(OpenAiJudge::new(&config.llm)?);
    let runner = Arc::new(Runner::new(config, judge));

    match args.command {
        Command::Serve { host, port } => {
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("Invalid listen address: {host}:{port}"))?;
            api::serve(runner, addr).await
        }
        Command::Evaluate { request: request_path, output } => {
            let content = std::fs::read_to_string(&request_path)
                .with_context(|| format!("Failed to read request file: {}", request_path.display()))?;
            let request: EvaluationRequest = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse request JSON: {}", request_path.display()))?;

            let outcome = runner.run(&request).await?;
            output::print_outcome(&outcome, output);
            Ok(())
        }
    }
}
