//! mnemo-service — embedding and vector-search sidecar.
//!
//! Spawned by the retrieval client, or run standalone for debugging.
//! Stdout carries only the launcher handshake; logs go to stderr.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use mnemo_service::{ModelConfig, ModelKind, Service, ServiceConfig};

/// Embedding and vector-search service for mnemo.
#[derive(Parser)]
#[command(name = "mnemo-service")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to bind on 127.0.0.1 (0 picks an ephemeral port).
    #[arg(long, default_value_t = 0)]
    port: u16,

    /// Index database path. Defaults to the platform data dir; pass
    /// `:memory:` for an ephemeral index.
    #[arg(long, env = "MNEMO_DATA_DIR")]
    index_path: Option<PathBuf>,

    /// Embedding model: `hash` (no files needed) or `local` (ONNX).
    #[arg(long, default_value = "hash")]
    model: String,

    /// ONNX model file, required for `--model local`.
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// tokenizer.json file, required for `--model local`.
    #[arg(long)]
    tokenizer_path: Option<PathBuf>,

    /// Embedding dimensions; must match the model.
    #[arg(long, default_value_t = mnemo_embed::DEFAULT_DIMENSIONS)]
    dims: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs to stderr; stdout is reserved for the launcher handshake.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("MNEMO_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mnemo_service=info,warn")),
        )
        .init();

    let kind = match args.model.as_str() {
        "hash" => ModelKind::Hash,
        "local" => ModelKind::Local,
        other => anyhow::bail!("unknown model kind {other:?} (expected hash or local)"),
    };

    let index_path = match args.index_path {
        Some(p) if p.as_os_str() == ":memory:" => None,
        Some(p) => Some(p),
        None => Some(ServiceConfig::default_index_path()),
    };

    let bind: SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;

    let mut config = ServiceConfig::new()
        .with_bind_address(bind)
        .with_model(ModelConfig {
            kind,
            model_path: args.model_path,
            tokenizer_path: args.tokenizer_path,
            dims: args.dims,
        });
    if let Some(path) = index_path {
        config = config.with_index_path(path);
    }

    Service::new(config)?.run().await?;
    Ok(())
}
