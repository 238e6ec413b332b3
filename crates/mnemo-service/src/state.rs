//! Application state shared across handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{error, info};

use mnemo_embed::{Embedder, HashEmbedder, SharedEmbedder};
use mnemo_index::VectorIndex;

use crate::config::{ModelKind, ServiceConfig};
use crate::error::{Result, ServiceError};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The vector index. rusqlite connections are not Sync, so access is
    /// serialized through a mutex.
    pub index: Arc<Mutex<VectorIndex>>,

    /// The embedder, installed once warm-up completes.
    embedder: Arc<RwLock<Option<SharedEmbedder>>>,

    /// Flipped true when the embedder is installed.
    model_loaded: Arc<AtomicBool>,

    /// Flipped true when warm-up failed; health reports degraded.
    model_failed: Arc<AtomicBool>,

    /// Service configuration.
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    /// Create application state, opening the configured index.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let index = match &config.index_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| ServiceError::Internal(format!("create data dir: {e}")))?;
                }
                VectorIndex::open(path, config.model.dims)?
            }
            None => VectorIndex::open_in_memory(config.model.dims)?,
        };

        Ok(Self {
            index: Arc::new(Mutex::new(index)),
            embedder: Arc::new(RwLock::new(None)),
            model_loaded: Arc::new(AtomicBool::new(false)),
            model_failed: Arc::new(AtomicBool::new(false)),
            config: Arc::new(config),
        })
    }

    /// Whether the embedding model is ready.
    pub fn model_loaded(&self) -> bool {
        self.model_loaded.load(Ordering::SeqCst)
    }

    /// Whether model warm-up failed.
    pub fn model_failed(&self) -> bool {
        self.model_failed.load(Ordering::SeqCst)
    }

    /// Name of the installed embedder, or a placeholder during warm-up.
    pub fn model_name(&self) -> String {
        self.embedder
            .read()
            .as_ref()
            .map(|e| e.name().to_string())
            .unwrap_or_else(|| "loading".to_string())
    }

    /// Install an embedder and mark the model loaded.
    pub fn install_embedder(&self, embedder: SharedEmbedder) {
        info!(model = embedder.name(), dims = embedder.dimensions(), "embedding model ready");
        *self.embedder.write() = Some(embedder);
        self.model_loaded.store(true, Ordering::SeqCst);
    }

    /// The installed embedder, or `ModelNotReady` during warm-up.
    pub fn embedder(&self) -> Result<SharedEmbedder> {
        self.embedder
            .read()
            .as_ref()
            .cloned()
            .ok_or(ServiceError::ModelNotReady)
    }

    /// Load the configured embedding model and install it.
    ///
    /// The hash model installs immediately; the local model loads on a
    /// blocking task since ONNX session creation takes seconds. Returns
    /// true on success; on failure the service keeps serving with
    /// `model_loaded: false` and health reports degraded.
    pub async fn warm_up(&self) -> bool {
        let result = match self.config.model.kind {
            ModelKind::Hash => {
                let dims = self.config.model.dims;
                Ok(Arc::new(HashEmbedder::new(dims)) as SharedEmbedder)
            }
            ModelKind::Local => self.load_local_embedder().await,
        };

        match result {
            Ok(embedder) => {
                self.install_embedder(embedder);
                true
            }
            Err(e) => {
                error!(error = %e, "embedding model warm-up failed");
                self.model_failed.store(true, Ordering::SeqCst);
                false
            }
        }
    }

    #[cfg(feature = "local-embeddings")]
    async fn load_local_embedder(&self) -> Result<SharedEmbedder> {
        let model = self
            .config
            .model
            .model_path
            .clone()
            .ok_or_else(|| ServiceError::Internal("local model requires --model-path".into()))?;
        let tokenizer = self
            .config
            .model
            .tokenizer_path
            .clone()
            .ok_or_else(|| ServiceError::Internal("local model requires --tokenizer-path".into()))?;
        let dims = self.config.model.dims;

        let embedder = tokio::task::spawn_blocking(move || {
            mnemo_embed::local::LocalEmbedder::load(model, tokenizer, dims)
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("warm-up task: {e}")))??;

        Ok(Arc::new(embedder))
    }

    #[cfg(not(feature = "local-embeddings"))]
    async fn load_local_embedder(&self) -> Result<SharedEmbedder> {
        Err(ServiceError::Internal(
            "this build does not include local embeddings; rebuild with --features local-embeddings"
                .into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_model_not_ready_before_warmup() {
        let state = AppState::new(ServiceConfig::default()).unwrap();
        assert!(!state.model_loaded());
        assert!(matches!(state.embedder(), Err(ServiceError::ModelNotReady)));
    }

    #[tokio::test]
    async fn test_hash_warmup_installs_embedder() {
        let state = AppState::new(ServiceConfig::default()).unwrap();
        assert!(state.warm_up().await);
        assert!(state.model_loaded());
        assert!(!state.model_failed());
        assert_eq!(state.model_name(), "hash");
        assert!(state.embedder().is_ok());
    }

    #[cfg(not(feature = "local-embeddings"))]
    #[tokio::test]
    async fn test_local_without_feature_degrades() {
        let config = ServiceConfig::default().with_model(crate::config::ModelConfig {
            kind: ModelKind::Local,
            ..Default::default()
        });
        let state = AppState::new(config).unwrap();
        assert!(!state.warm_up().await);
        assert!(state.model_failed());
        assert!(!state.model_loaded());
    }
}
