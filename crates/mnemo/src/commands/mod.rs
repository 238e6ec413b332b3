//! CLI command implementations.

pub mod clear;
pub mod memory;
pub mod prompt;
pub mod search;
pub mod serve;
pub mod status;
pub mod tools;

use anyhow::{Context, Result};

use mnemo_client::{ClientConfig, RetrievalClient};

use crate::Cli;

/// Build and initialize a retrieval client from the global CLI flags.
///
/// With `--service <url>` the client attaches to a running service;
/// otherwise it spawns one (locating `mnemo-service` next to this binary
/// or on PATH).
pub async fn ready_client(cli: &Cli) -> Result<RetrievalClient> {
    let mut config = ClientConfig::new();
    if let Some(url) = &cli.service {
        tracing::debug!(url, "attaching to external service");
        config = config.with_base_url(url.parse().context("invalid --service URL")?);
    }

    let client = RetrievalClient::new(config);
    client
        .initialize()
        .await
        .context("retrieval service failed to start")?;
    Ok(client)
}

/// Print a value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
