//! `mnemo status` — service health and document counts.

use anyhow::Result;
use clap::Args;

use crate::Cli;
use crate::commands::{print_json, ready_client};

#[derive(Args, Clone)]
pub struct StatusArgs {}

pub async fn run(_args: StatusArgs, cli: &Cli) -> Result<()> {
    let client = ready_client(cli).await?;

    let Some(status) = client.service_status().await else {
        anyhow::bail!("service is not answering");
    };

    if cli.json {
        return print_json(&status);
    }

    println!("model: {}", status.model);
    if status.collections.is_empty() {
        println!("namespaces: (none)");
    } else {
        println!("namespaces:");
        for ns in &status.collections {
            let count = status.document_counts.get(ns).copied().unwrap_or(0);
            println!("  {ns}: {count} documents");
        }
    }
    Ok(())
}
