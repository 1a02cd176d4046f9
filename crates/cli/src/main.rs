//! sqlorch command-line entry point.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::ingest::IngestArgs;
use commands::list::ListArgs;
use commands::run::RunArgs;
use commands::toggle::InstructionRef;
use config::ConnectionArgs;

#[derive(Parser)]
#[command(name = "sqlorch")]
#[command(author, version, about = "Metadata-driven SQL job orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a SQL file into a job under APPEND, REPLACE or DELETE
    Ingest(IngestArgs),

    /// Execute a job group (or one job) for a tenant
    Run(RunArgs),

    /// Create the catalog schema and apply migrations
    Migrate,

    /// Show job groups, jobs and instruction counts
    List(ListArgs),

    /// Enable one instruction
    Enable(InstructionRef),

    /// Disable one instruction
    Disable(InstructionRef),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "sqlorch=debug,sqlorch_core=debug,sqlorch_db=debug"
    } else {
        "sqlorch=info,sqlorch_core=info,sqlorch_db=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match dispatch(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Command failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Ingest(args) => commands::ingest::execute(&cli.connection.catalog()?, args).await,
        Commands::Run(args) => {
            commands::run::execute(&cli.connection.catalog()?, &cli.connection.target()?, args)
                .await
        }
        Commands::Migrate => commands::migrate::execute(&cli.connection.catalog()?).await,
        Commands::List(args) => commands::list::execute(&cli.connection.catalog()?, args).await,
        Commands::Enable(target) => {
            commands::toggle::execute(&cli.connection.catalog()?, target, true).await
        }
        Commands::Disable(target) => {
            commands::toggle::execute(&cli.connection.catalog()?, target, false).await
        }
    }
}
