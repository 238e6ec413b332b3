//! Error types for the index crate.

use thiserror::Error;

/// Errors that can occur in the vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Database connection or operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Embedding length does not match the index dimensions.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensions the index was created with.
        expected: usize,
        /// Dimensions of the rejected embedding.
        actual: usize,
    },

    /// Invalid namespace or document payload.
    #[error("Invalid data: {0}")]
    Validation(#[from] mnemo_types::ValidationError),
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
