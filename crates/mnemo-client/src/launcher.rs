//! Service process launch pipeline.
//!
//! Each initialization stage is a standalone function so it can be tested
//! in isolation: locate the binary, provision model assets, spawn with
//! piped stdio, and complete the stdout handshake. The stages run strictly
//! sequentially; any failure aborts initialization.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use mnemo_types::handshake;

use crate::config::{ClientConfig, SERVICE_BINARY, ServiceModel};
use crate::error::{Result, RetrievalError};

/// A spawned service that has announced its URL but may still be warming
/// up its model.
#[derive(Debug)]
pub struct SpawnedService {
    /// The child process; killed on drop unless handed to a monitor.
    pub child: Child,
    /// Base URL announced on stdout.
    pub base_url: Url,
}

// ─────────────────────────────────────────────────────────────────────────────
// Stage 1: binary discovery
// ─────────────────────────────────────────────────────────────────────────────

/// Locate the service binary.
///
/// Search order: explicit config path, `MNEMO_SERVICE_BIN`, a sibling of
/// the current executable, then every `PATH` entry.
pub fn locate_binary(config: &ClientConfig) -> Result<PathBuf> {
    if let Some(path) = &config.binary {
        if path.is_file() {
            return Ok(path.clone());
        }
        warn!(path = %path.display(), "configured service binary does not exist");
        return Err(RetrievalError::BinaryNotFound);
    }

    if let Some(path) = std::env::var_os("MNEMO_SERVICE_BIN") {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join(SERVICE_BINARY);
            if sibling.is_file() {
                return Ok(sibling);
            }
        }
    }

    if let Some(path_var) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(SERVICE_BINARY);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }

    Err(RetrievalError::BinaryNotFound)
}

// ─────────────────────────────────────────────────────────────────────────────
// Stage 2: asset provisioning
// ─────────────────────────────────────────────────────────────────────────────

/// Ensure every declared model asset exists under the models dir,
/// downloading absent ones with a bounded per-asset timeout.
///
/// A required asset failure aborts initialization; optional failures log
/// and continue so an optional feature never blocks startup.
pub async fn ensure_assets(config: &ClientConfig) -> Result<()> {
    if config.model == ServiceModel::Hash || config.assets.is_empty() {
        return Ok(());
    }

    let models_dir = config.models_dir();
    std::fs::create_dir_all(&models_dir).map_err(|e| RetrievalError::Provision {
        asset: models_dir.display().to_string(),
        required: true,
        message: format!("create models dir: {e}"),
    })?;

    for asset in &config.assets {
        let target = models_dir.join(&asset.file_name);
        if is_present(&target) {
            debug!(asset = %asset.file_name, "asset already present");
            continue;
        }

        info!(asset = %asset.file_name, url = %asset.url, "downloading model asset");
        let outcome = timeout(config.install_timeout, fetch_asset(&asset.url, &target)).await;
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(message)) => Some(message),
            Err(_) => Some(format!("timed out after {:?}", config.install_timeout)),
        };

        if let Some(message) = failure {
            if asset.required {
                return Err(RetrievalError::Provision {
                    asset: asset.file_name.clone(),
                    required: true,
                    message,
                });
            }
            warn!(asset = %asset.file_name, %message, "optional asset unavailable; continuing");
        }
    }

    Ok(())
}

fn is_present(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

/// Download one asset to `target`, writing via a temp file so a partial
/// download never looks like a present asset.
async fn fetch_asset(url: &str, target: &Path) -> std::result::Result<(), String> {
    let response = reqwest::get(url).await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;

    let tmp = target.with_extension("partial");
    tokio::fs::write(&tmp, &bytes).await.map_err(|e| e.to_string())?;
    tokio::fs::rename(&tmp, target).await.map_err(|e| e.to_string())?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Stage 3: spawn + stdout handshake
// ─────────────────────────────────────────────────────────────────────────────

/// Spawn the service and wait for its listening announcement.
///
/// Stdout carries the handshake; stderr is forwarded to tracing. The
/// child's environment inherits the parent's, extended with `MNEMO_LOG`.
pub async fn spawn_service(config: &ClientConfig, binary: &Path) -> Result<SpawnedService> {
    let mut cmd = Command::new(binary);
    cmd.arg("--port")
        .arg("0")
        .arg("--dims")
        .arg(config.dims.to_string())
        .arg("--index-path")
        .arg(config.index_path());

    match config.model {
        ServiceModel::Hash => {
            cmd.arg("--model").arg("hash");
        }
        ServiceModel::Local => {
            cmd.arg("--model")
                .arg("local")
                .arg("--model-path")
                .arg(config.models_dir().join("model.onnx"))
                .arg("--tokenizer-path")
                .arg(config.models_dir().join("tokenizer.json"));
        }
    }

    cmd.env(
        "MNEMO_LOG",
        std::env::var("MNEMO_LOG").unwrap_or_else(|_| "info".to_string()),
    );
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|e| RetrievalError::Spawn(format!("failed to spawn {}: {e}", binary.display())))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| RetrievalError::Spawn("failed to capture stdout".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| RetrievalError::Spawn("failed to capture stderr".to_string()))?;

    // Forward service diagnostics into our log stream.
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(target: "mnemo_client::service", "{line}");
        }
    });

    let mut stdout_lines = BufReader::new(stdout).lines();
    let announced = timeout(config.startup_timeout, async {
        while let Ok(Some(line)) = stdout_lines.next_line().await {
            if let Some(url) = handshake::parse_listening(&line) {
                return Some(url.to_string());
            }
            debug!(target: "mnemo_client::service", "{line}");
        }
        None
    })
    .await;

    let base_url = match announced {
        Ok(Some(url)) => url,
        Ok(None) => {
            // Stdout closed without an announcement: the child died.
            let code = child.wait().await.ok().and_then(|s| s.code());
            return Err(RetrievalError::Crashed { code });
        }
        Err(_) => {
            let _ = child.kill().await;
            return Err(RetrievalError::StartupTimeout(config.startup_timeout));
        }
    };

    // Keep draining stdout so the child never blocks on a full pipe; the
    // model-ready line lands here, though readiness is confirmed by health
    // polling rather than by trusting the announcement.
    tokio::spawn(async move {
        while let Ok(Some(line)) = stdout_lines.next_line().await {
            if handshake::is_model_ready(&line) {
                debug!("service announced model ready");
            }
        }
    });

    let base_url = Url::parse(&base_url)?;
    info!(url = %base_url, "service listening");

    Ok(SpawnedService { child, base_url })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_binary_is_not_found() {
        let config = ClientConfig::new().with_binary("/definitely/not/here/mnemo-service");
        let err = locate_binary(&config).unwrap_err();
        assert!(matches!(err, RetrievalError::BinaryNotFound));
    }

    #[test]
    fn test_explicit_binary_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SERVICE_BINARY);
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();

        let config = ClientConfig::new().with_binary(&path);
        assert_eq!(locate_binary(&config).unwrap(), path);
    }

    #[tokio::test]
    async fn test_hash_model_needs_no_assets() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::new().with_data_dir(dir.path());
        ensure_assets(&config).await.unwrap();
        // Nothing downloaded, nothing created.
        assert!(!config.models_dir().exists());
    }

    #[tokio::test]
    async fn test_present_assets_are_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::new().with_data_dir(dir.path()).with_local_model();
        // Point URLs at nowhere: presence must short-circuit the fetch.
        for asset in &mut config.assets {
            asset.url = "http://127.0.0.1:1/unreachable".to_string();
        }

        std::fs::create_dir_all(config.models_dir()).unwrap();
        std::fs::write(config.models_dir().join("model.onnx"), b"model").unwrap();
        std::fs::write(config.models_dir().join("tokenizer.json"), b"{}").unwrap();

        ensure_assets(&config).await.unwrap();
    }

    #[tokio::test]
    async fn test_spawn_nonexistent_binary_fails() {
        let config = ClientConfig::new();
        let err = spawn_service(&config, Path::new("/no/such/mnemo-service"))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Spawn(_)));
    }
}
