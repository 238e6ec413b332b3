//! `mnemo index-memory` — index a single memory.

use anyhow::Result;
use clap::Args;

use mnemo_types::{Importance, MemoryDocument, MemoryKind};

use crate::Cli;
use crate::commands::ready_client;

#[derive(Args, Clone)]
pub struct IndexMemoryArgs {
    /// The memory text
    pub text: String,

    /// Memory kind: llm_memory, user_info, world_fact, volatile_info,
    /// or conversation_turn
    #[arg(long, default_value = "llm_memory")]
    pub kind: String,

    /// Importance: low, normal, or high
    #[arg(long, default_value = "normal")]
    pub importance: String,
}

pub async fn run(args: IndexMemoryArgs, cli: &Cli) -> Result<()> {
    let kind: MemoryKind = serde_json::from_value(serde_json::json!(args.kind))
        .map_err(|_| anyhow::anyhow!("unknown memory kind {:?}", args.kind))?;
    let importance: Importance = serde_json::from_value(serde_json::json!(args.importance))
        .map_err(|_| anyhow::anyhow!("unknown importance {:?}", args.importance))?;

    let memory = MemoryDocument::new(&args.text)
        .with_kind(kind)
        .with_importance(importance);
    let namespace = memory.namespace();

    let client = ready_client(cli).await?;
    client.index_memory(memory).await?;

    println!("indexed into {namespace}");
    Ok(())
}
