//! Retrieval client for mnemo.
//!
//! This crate owns the embedding service's out-of-process lifecycle and
//! exposes the typed retrieval API the assistant uses:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  RetrievalClient                                                   │
//! │  initialize(): locate binary → provision assets → spawn →          │
//! │                stdout handshake → health-poll → Ready              │
//! │  index_tools / search_tools / index_memory / relevant_memories     │
//! │  clear_namespace (protected namespaces refused)                    │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Concurrent `initialize()` calls converge on one in-flight attempt, so a
//! client never spawns two services. Retrieval operations degrade to empty
//! results whenever the service is not ready — UI callers need no error
//! handling around them. An unexpected service exit flips the client to
//! `Failed` and emits a [`ServiceEvent::Crashed`]; the next `initialize()`
//! retries from scratch.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod launcher;
pub mod lifecycle;
pub mod retrieval;
pub mod scoring;

pub use client::RetrievalClient;
pub use config::{ClientConfig, ModelAsset, ServiceModel, default_data_dir};
pub use error::{Result, RetrievalError};
pub use http::ServiceClient;
pub use lifecycle::{LifecycleState, ServiceEvent};
pub use retrieval::{ScoredMemory, ToolSearchBundle};
