//! `mnemo index-tools` — index tool descriptors from a JSON file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mnemo_types::ToolDescriptor;

use crate::Cli;
use crate::commands::ready_client;

#[derive(Args, Clone)]
pub struct IndexToolsArgs {
    /// JSON file containing an array of tool descriptors
    pub file: PathBuf,
}

pub async fn run(args: IndexToolsArgs, cli: &Cli) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let tools: Vec<ToolDescriptor> =
        serde_json::from_str(&raw).context("parsing tool descriptors")?;

    let client = ready_client(cli).await?;
    let changed = client.index_tools(&tools).await?;

    println!("{} tools, {} (re)indexed", tools.len(), changed);
    Ok(())
}
