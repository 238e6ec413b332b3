//! `mnemo clear` — clear a namespace.

use anyhow::Result;
use clap::Args;

use crate::Cli;
use crate::commands::ready_client;

#[derive(Args, Clone)]
pub struct ClearArgs {
    /// Namespace to clear
    pub namespace: String,
}

pub async fn run(args: ClearArgs, cli: &Cli) -> Result<()> {
    if mnemo_types::is_protected(&args.namespace) {
        anyhow::bail!("{} is protected and cannot be cleared", args.namespace);
    }

    let client = ready_client(cli).await?;
    client.clear_namespace(&args.namespace).await?;

    println!("cleared {}", args.namespace);
    Ok(())
}
