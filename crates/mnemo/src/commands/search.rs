//! `mnemo search` — query indexed tools or memories.

use anyhow::Result;
use clap::Args;

use mnemo_types::{DEFAULT_MIN_SCORE, DEFAULT_TOP_K};

use crate::Cli;
use crate::commands::{print_json, ready_client};

#[derive(Args, Clone)]
pub struct SearchArgs {
    /// The query text
    pub query: String,

    /// Search memories instead of tools
    #[arg(long)]
    pub memories: bool,

    /// Maximum results
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Minimum similarity score (tools search only)
    #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
    pub min_score: f32,
}

pub async fn run(args: SearchArgs, cli: &Cli) -> Result<()> {
    let client = ready_client(cli).await?;

    if args.memories {
        let memories = client.relevant_memories(&args.query, args.top_k).await;
        if cli.json {
            let rows: Vec<_> = memories
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "id": m.id,
                        "namespace": m.namespace,
                        "text": m.text,
                        "score": m.score,
                        "relevance": m.relevance,
                    })
                })
                .collect();
            return print_json(&rows);
        }
        if memories.is_empty() {
            println!("no relevant memories");
        }
        for m in memories {
            println!("[{:.2}] ({}) {}", m.relevance, m.namespace, m.text);
        }
        return Ok(());
    }

    let bundle = client
        .search_tools(&args.query, args.top_k, args.min_score)
        .await;
    if cli.json {
        return print_json(&bundle.tools);
    }
    if bundle.is_empty() {
        println!("no matching tools");
    } else {
        println!("{}", bundle.descriptions);
    }
    Ok(())
}
