//! Search endpoint.

use axum::{Json, extract::State};
use tracing::debug;

use mnemo_types::{
    NamespaceHits, ResponseStatus, SearchRequest, SearchResponse, validate_namespace,
};

use crate::error::Result;
use crate::state::AppState;

/// `POST /search`.
///
/// The query is embedded once, then each requested namespace is searched
/// independently. Results stay grouped per namespace — scores from
/// different namespaces have different semantics and are never merged
/// into one ranking here.
pub async fn search_handler(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    for ns in &request.namespaces {
        validate_namespace(ns)?;
    }
    let embedder = state.embedder()?;

    let query_embedding = embedder.embed(&request.query).await?;

    let mut results = Vec::with_capacity(request.namespaces.len());
    {
        let index = state.index.lock();
        for namespace in &request.namespaces {
            let hits = index.search(namespace, &query_embedding, request.top_k, request.min_score)?;
            debug!(namespace = %namespace, hits = hits.len(), "namespace searched");
            results.push(NamespaceHits {
                namespace: namespace.clone(),
                hits,
            });
        }
    }

    Ok(Json(SearchResponse {
        status: ResponseStatus::Ok,
        results,
    }))
}
