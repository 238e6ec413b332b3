//! Error types for the embedding crate.

use thiserror::Error;

/// Errors produced while loading a model or embedding text.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Model file missing, unreadable, or inference failed.
    #[error("model error: {0}")]
    Model(String),

    /// Tokenizer file missing or tokenization failed.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
}

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;
