//! Request and response bodies for the four service operations.
//!
//! Every response carries an explicit [`ResponseStatus`] discriminator so
//! callers can tell an empty result from a failed request independently of
//! the HTTP status code. Multi-namespace searches return per-namespace
//! result sets; scores are never merged across namespaces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::{Document, SearchHit};

/// Default number of results per namespace.
pub const DEFAULT_TOP_K: usize = 3;

/// Default minimum similarity score.
pub const DEFAULT_MIN_SCORE: f32 = 0.1;

/// Success/error discriminator present in every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Body of `POST /index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRequest {
    /// Target namespace, created implicitly on first write.
    pub namespace: String,
    /// Documents to embed and upsert.
    pub documents: Vec<Document>,
}

/// Response of `POST /index`.
///
/// `failed` lists the ids that could not be embedded or stored; a caller
/// distinguishes total success (`failed` empty) from partial failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub status: ResponseStatus,
    /// Number of documents successfully indexed.
    pub count: usize,
    /// Ids that failed, in request order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
}

/// Body of `POST /search`.
///
/// The sole search contract takes a namespace list; searching one
/// namespace means a singleton list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Namespaces to search, each independently.
    pub namespaces: Vec<String>,
    /// Query text to embed.
    pub query: String,
    /// Maximum results per namespace.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum similarity score.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_min_score() -> f32 {
    DEFAULT_MIN_SCORE
}

/// Results for one searched namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceHits {
    pub namespace: String,
    /// Hits ordered by descending score.
    pub hits: Vec<SearchHit>,
}

/// Response of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: ResponseStatus,
    /// One entry per requested namespace, in request order. A namespace
    /// with no matches contributes an entry with an empty hit list.
    pub results: Vec<NamespaceHits>,
}

/// Body of `POST /clear`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearRequest {
    pub namespace: String,
}

/// Response of `POST /clear`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    pub status: ResponseStatus,
}

/// Overall service health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    /// The service is up but the embedding model failed to load.
    Degraded,
}

/// Response of `GET /health`. Pollable without side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// False during model warm-up; index/search fail until true.
    pub model_loaded: bool,
    /// Namespaces currently present in the index.
    #[serde(default)]
    pub collections: Vec<String>,
}

/// Response of `GET /status`: health plus per-namespace document counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: ResponseStatus,
    /// Name of the embedding model in use.
    pub model: String,
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(default)]
    pub document_counts: BTreeMap<String, usize>,
}

/// Error body returned for any failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: ResponseStatus,
    /// Stable machine-readable code, e.g. `model_not_ready`.
    pub code: String,
    pub message: String,
}
