//! Error types for the retrieval client.

use std::time::Duration;

use thiserror::Error;

use mnemo_types::ValidationError;

/// Errors produced by the retrieval client.
///
/// Only a subset is fatal to initialization (see [`RetrievalError::is_fatal`]);
/// everything else degrades the retrieval feature to empty results rather
/// than surfacing to UI callers.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The service binary could not be located.
    #[error(
        "service binary not found (searched explicit config, MNEMO_SERVICE_BIN, \
         alongside the current executable, and PATH)"
    )]
    BinaryNotFound,

    /// A model asset could not be provisioned.
    #[error("failed to provision model asset {asset:?}: {message}")]
    Provision {
        /// File name of the asset.
        asset: String,
        /// Required assets are fatal; optional ones only log.
        required: bool,
        message: String,
    },

    /// Spawning the service process failed.
    #[error("failed to spawn service: {0}")]
    Spawn(String),

    /// The service did not become ready in time.
    #[error("service did not become ready within {0:?}")]
    StartupTimeout(Duration),

    /// The service process exited unexpectedly.
    #[error("service exited unexpectedly with code {code:?}")]
    Crashed {
        /// Process exit code, if the OS reported one.
        code: Option<i32>,
    },

    /// The service answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Request { status: u16, message: String },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Payload rejected before any network call.
    #[error("Invalid data: {0}")]
    Validation(#[from] ValidationError),

    /// A concurrent initialization attempt failed; carries its message.
    #[error("initialization failed: {0}")]
    Initialization(String),
}

impl RetrievalError {
    /// Whether this error is fatal to initialization.
    ///
    /// Fatal errors leave the client in `Failed`; a later `initialize()`
    /// call clears the error and retries from scratch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::BinaryNotFound
                | Self::Provision { required: true, .. }
                | Self::Spawn(_)
                | Self::StartupTimeout(_)
        )
    }
}

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;
