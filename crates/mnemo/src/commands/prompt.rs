//! `mnemo prompt` — assemble a token-budgeted prompt for a query.
//!
//! Dry run of the full retrieval flow: tool search, memory search, and
//! prompt assembly. Useful for inspecting exactly what an LLM would be
//! sent without calling one.

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use mnemo_prompt::{AssemblerConfig, PromptAssembler, Provider, ProviderPayload};
use mnemo_types::{DEFAULT_MIN_SCORE, DEFAULT_TOP_K};

use crate::Cli;
use crate::commands::{print_json, ready_client};

#[derive(Args, Clone)]
pub struct PromptArgs {
    /// The user query
    pub query: String,

    /// Target provider: anthropic, openai, gemini, ollama, llamacpp
    #[arg(long, default_value = "anthropic")]
    pub provider: String,

    /// User token limit (capped by the provider ceiling)
    #[arg(long, default_value_t = 32_000)]
    pub max_tokens: usize,

    /// How many memories to retrieve
    #[arg(long, default_value_t = 5)]
    pub memories: usize,
}

pub async fn run(args: PromptArgs, cli: &Cli) -> Result<()> {
    let provider = Provider::parse(&args.provider)
        .ok_or_else(|| anyhow::anyhow!("unknown provider {:?}", args.provider))?;

    let client = ready_client(cli).await?;

    let tools = client
        .search_tools(&args.query, DEFAULT_TOP_K, DEFAULT_MIN_SCORE)
        .await;
    let memories = client.relevant_memories(&args.query, args.memories).await;

    let assembler = PromptAssembler::new(AssemblerConfig::new(provider, args.max_tokens));
    let prompt = assembler.assemble(&args.query, &tools, Some(&memories), &[], Utc::now());

    if cli.json {
        return print_json(&serde_json::json!({
            "max_tokens": prompt.max_tokens,
            "estimated_tokens": prompt.estimated_tokens,
            "messages": prompt.messages,
        }));
    }

    eprintln!(
        "~{} of {} tokens, {} tools, {} memories",
        prompt.estimated_tokens,
        prompt.max_tokens,
        tools.tools.len(),
        memories.len(),
    );
    match assembler.format_for_provider(&prompt.messages) {
        ProviderPayload::Chat(messages) => {
            for message in messages {
                println!("--- {} ---", message.role.label());
                println!("{}\n", message.content);
            }
        }
        ProviderPayload::Text(text) => println!("{text}"),
    }
    Ok(())
}
