//! Service configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Which embedding model the service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Deterministic token-hash embeddings; no model files needed.
    Hash,
    /// Local ONNX inference (requires the `local-embeddings` feature and
    /// model files on disk).
    Local,
}

/// Embedding model configuration.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub kind: ModelKind,
    /// ONNX model file, for [`ModelKind::Local`].
    pub model_path: Option<PathBuf>,
    /// tokenizer.json file, for [`ModelKind::Local`].
    pub tokenizer_path: Option<PathBuf>,
    /// Embedding dimensions; must match the model.
    pub dims: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Hash,
            model_path: None,
            tokenizer_path: None,
            dims: mnemo_embed::DEFAULT_DIMENSIONS,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to bind. Port 0 picks an ephemeral port, announced on
    /// stdout for the launcher.
    pub bind_address: SocketAddr,
    /// Index database path. `None` keeps the index in memory.
    pub index_path: Option<PathBuf>,
    /// Embedding model.
    pub model: ModelConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:0".parse().expect("valid literal address"),
            index_path: None,
            model: ModelConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Store the index at the given path instead of in memory.
    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    /// Set the model configuration.
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    /// Default index location under the platform data dir.
    pub fn default_index_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mnemo")
            .join("index.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::new();
        assert_eq!(config.bind_address.port(), 0);
        assert!(config.index_path.is_none());
        assert_eq!(config.model.kind, ModelKind::Hash);
        assert_eq!(config.model.dims, 384);
    }

    #[test]
    fn test_builder() {
        let config = ServiceConfig::new()
            .with_bind_address("127.0.0.1:5055".parse().unwrap())
            .with_index_path("/tmp/idx.db");
        assert_eq!(config.bind_address.port(), 5055);
        assert_eq!(config.index_path.as_deref(), Some(std::path::Path::new("/tmp/idx.db")));
    }
}
