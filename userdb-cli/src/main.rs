//! userdb CLI - user records over HTTP, backed by a pooled relational store
//!
//! Subcommands:
//! - `serve`: run the HTTP API (`/api/users`, `/test-db`, `/health`, static files)
//! - `ping`: check the store is reachable with the configured pool options
//! - `config`: inspect the effective configuration
//! - `completions`: generate shell completion scripts

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;
mod config;
mod tracing_setup;

use config::AppConfig;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "userdb",
    author,
    version,
    about = "User records over HTTP, backed by a pooled MySQL or SQLite store"
)]
struct Cli {
    /// Config file (default: ~/.userdb/config.toml when present)
    #[arg(long, short = 'c', global = true, env = "USERDB_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging unless RUST_LOG is set
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Check that the store answers a probe query
    Ping,
    /// Inspect configuration (path, show)
    Config(commands::config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })
    .ok();

    let result = run(cli).await;
    tracing_setup::shutdown_otel();
    result
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions(args) = cli.command {
        return run_completions(args);
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, config).await,
        Commands::Ping => commands::run_ping(config).await,
        Commands::Config(args) => commands::run_config(args, config),
        Commands::Completions(_) => Ok(()),
    }
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, bin_name, &mut std::io::stdout());
    Ok(())
}
