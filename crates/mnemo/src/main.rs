//! mnemo - local semantic retrieval sidecar for LLM assistants.
//!
//! Main entry point for the mnemo CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{clear, prompt, search, serve, status, tools};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// mnemo - local semantic retrieval for LLM assistants
#[derive(Parser)]
#[command(name = "mnemo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Attach to a running service instead of spawning one
    #[arg(long, global = true, env = "MNEMO_SERVICE_URL")]
    pub service: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run the embedding service in the foreground
    Serve(serve::ServeArgs),

    /// Show service health and per-namespace document counts
    Status(status::StatusArgs),

    /// Search indexed tools or memories
    Search(search::SearchArgs),

    /// Index tool descriptors from a JSON file
    IndexTools(tools::IndexToolsArgs),

    /// Index a single memory
    IndexMemory(commands::memory::IndexMemoryArgs),

    /// Clear a namespace (protected namespaces are refused)
    Clear(clear::ClearArgs),

    /// Assemble a token-budgeted prompt for a query (dry run)
    Prompt(prompt::PromptArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing — console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "mnemo=debug,mnemo_client=debug,mnemo_service=debug,mnemo_index=debug,info"
    } else {
        "mnemo=info,mnemo_client=info,mnemo_service=info,warn"
    };

    let log_dir = mnemo_client::default_data_dir().join("logs");
    let file_appender = tracing_appender::rolling::daily(&log_dir, "mnemo.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(
                    tracing_subscriber::EnvFilter::try_from_env("MNEMO_LOG")
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "mnemo=debug,mnemo_client=debug,mnemo_service=debug,info",
                )),
        )
        .init();

    match cli.command.clone() {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Status(args) => status::run(args, &cli).await,
        Commands::Search(args) => search::run(args, &cli).await,
        Commands::IndexTools(args) => tools::run(args, &cli).await,
        Commands::IndexMemory(args) => commands::memory::run(args, &cli).await,
        Commands::Clear(args) => clear::run(args, &cli).await,
        Commands::Prompt(args) => prompt::run(args, &cli).await,
    }
}
