//! Retrieval client configuration.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Default per-asset provisioning timeout. ML model files run to tens of
/// megabytes, so this is generous.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Default startup timeout: spawn-to-model-ready.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default health-poll interval during startup.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(1);

/// Default per-request timeout for retrieval calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the service binary searched for on disk.
pub const SERVICE_BINARY: &str = "mnemo-service";

/// Which model the spawned service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceModel {
    /// Token-hash embeddings, no assets needed.
    #[default]
    Hash,
    /// Local ONNX inference; assets are provisioned before spawn.
    Local,
}

/// A model file the service needs on disk.
#[derive(Debug, Clone)]
pub struct ModelAsset {
    /// File name under `<data_dir>/models/`.
    pub file_name: String,
    /// Download URL used when the file is absent.
    pub url: String,
    /// Required assets abort initialization on failure; optional ones
    /// only log a warning.
    pub required: bool,
}

impl ModelAsset {
    /// Declare a required asset.
    pub fn required(file_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            url: url.into(),
            required: true,
        }
    }

    /// Declare an optional asset.
    pub fn optional(file_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            url: url.into(),
            required: false,
        }
    }
}

/// Configuration for [`crate::RetrievalClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Explicit service binary path; bypasses discovery when set.
    pub binary: Option<PathBuf>,

    /// Attach to an already-running service instead of spawning one.
    /// Skips binary discovery, provisioning, and spawn.
    pub base_url: Option<Url>,

    /// Data directory for the index and model assets.
    pub data_dir: PathBuf,

    /// Model the spawned service runs.
    pub model: ServiceModel,

    /// Embedding dimensions passed to the service.
    pub dims: usize,

    /// Model assets provisioned before spawning a `Local` service.
    pub assets: Vec<ModelAsset>,

    /// Per-asset provisioning timeout.
    pub install_timeout: Duration,

    /// Spawn-to-ready timeout.
    pub startup_timeout: Duration,

    /// Health-poll interval during startup.
    pub health_interval: Duration,

    /// Per-request timeout for retrieval calls.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            binary: None,
            base_url: None,
            data_dir: default_data_dir(),
            model: ServiceModel::Hash,
            dims: 384,
            assets: Vec::new(),
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            health_interval: DEFAULT_HEALTH_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit service binary path.
    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = Some(path.into());
        self
    }

    /// Attach to a running service at the given URL instead of spawning.
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Set the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Run the local ONNX model with the standard MiniLM assets.
    pub fn with_local_model(mut self) -> Self {
        self.model = ServiceModel::Local;
        if self.assets.is_empty() {
            self.assets = default_minilm_assets();
        }
        self
    }

    /// Set the startup timeout.
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Set the health-poll interval.
    pub fn with_health_interval(mut self, interval: Duration) -> Self {
        self.health_interval = interval;
        self
    }

    /// Directory holding model assets.
    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    /// Index database path handed to the spawned service.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("index.db")
    }
}

/// Platform data directory for mnemo.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mnemo")
}

/// Assets for the MiniLM-L6-v2 ONNX export the service runs by default.
pub fn default_minilm_assets() -> Vec<ModelAsset> {
    const BASE: &str = "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";
    vec![
        ModelAsset::required("model.onnx", format!("{BASE}/onnx/model.onnx")),
        ModelAsset::required("tokenizer.json", format!("{BASE}/tokenizer.json")),
    ]
}
