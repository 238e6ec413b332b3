//! Shared data model and wire contract for mnemo.
//!
//! This crate defines the types exchanged between the embedding service,
//! the retrieval client, and the prompt assembler:
//! - [`Document`] / [`SearchHit`]: what gets indexed and what comes back
//! - [`ToolDescriptor`]: a registered tool, indexed as a document
//! - [`MemoryDocument`]: a conversation memory with routing metadata
//! - [`wire`]: request/response bodies for the four service operations
//! - [`handshake`]: the stdout announcement protocol for the spawned service
//!
//! Namespaces partition the index; see [`namespace`] for the well-known
//! names and the protection rules.

pub mod document;
pub mod handshake;
pub mod memory;
pub mod message;
pub mod namespace;
pub mod tool;
pub mod validation;
pub mod wire;

pub use document::{Document, SearchHit};
pub use memory::{Importance, MemoryContext, MemoryDocument, MemoryKind, MemoryMetadata};
pub use message::{ChatMessage, Role};
pub use namespace::{
    CONVERSATION_HISTORY, LLM_MEMORIES, MEMORY_NAMESPACES, TOOLS, USER_INFO, VOLATILE_INFO,
    WORLD_FACTS, is_protected,
};
pub use tool::ToolDescriptor;
pub use validation::{ValidationError, validate_document, validate_namespace, validate_tools};
pub use wire::{
    ClearRequest, ClearResponse, DEFAULT_MIN_SCORE, DEFAULT_TOP_K, ErrorBody, HealthResponse,
    HealthStatus, IndexRequest, IndexResponse, NamespaceHits, ResponseStatus, SearchRequest,
    SearchResponse, StatusResponse,
};

use chrono::{DateTime, Utc};

/// Generate a new random document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current UTC timestamp.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
