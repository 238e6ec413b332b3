//! `mnemo serve` — run the embedding service in the foreground.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use mnemo_service::{ModelConfig, ModelKind, Service, ServiceConfig};

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Port to bind on 127.0.0.1 (0 picks an ephemeral port)
    #[arg(long, default_value_t = 0)]
    pub port: u16,

    /// Index database path (defaults to the platform data dir)
    #[arg(long, env = "MNEMO_DATA_DIR")]
    pub index_path: Option<PathBuf>,

    /// Embedding model: `hash` or `local`
    #[arg(long, default_value = "hash")]
    pub model: String,

    /// ONNX model file, for `--model local`
    #[arg(long)]
    pub model_path: Option<PathBuf>,

    /// tokenizer.json file, for `--model local`
    #[arg(long)]
    pub tokenizer_path: Option<PathBuf>,

    /// Embedding dimensions
    #[arg(long, default_value_t = 384)]
    pub dims: usize,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let kind = match args.model.as_str() {
        "hash" => ModelKind::Hash,
        "local" => ModelKind::Local,
        other => anyhow::bail!("unknown model kind {other:?} (expected hash or local)"),
    };

    let bind = format!("127.0.0.1:{}", args.port).parse()?;
    let mut config = ServiceConfig::new()
        .with_bind_address(bind)
        .with_model(ModelConfig {
            kind,
            model_path: args.model_path,
            tokenizer_path: args.tokenizer_path,
            dims: args.dims,
        });

    let index_path = args
        .index_path
        .unwrap_or_else(ServiceConfig::default_index_path);
    config = config.with_index_path(index_path);

    Service::new(config)?.run().await?;
    Ok(())
}
