//! Indexing and clearing endpoints.

use axum::{Json, extract::State};
use tracing::{info, warn};

use mnemo_types::{
    ClearRequest, ClearResponse, IndexRequest, IndexResponse, ResponseStatus, validate_document,
    validate_namespace,
};

use crate::error::Result;
use crate::state::AppState;

/// `POST /index`.
///
/// Embeds and upserts each document individually so one bad document does
/// not poison the batch: the response lists the ids that failed, letting
/// the caller tell total success from partial failure.
pub async fn index_handler(
    State(state): State<AppState>,
    Json(request): Json<IndexRequest>,
) -> Result<Json<IndexResponse>> {
    validate_namespace(&request.namespace)?;
    let embedder = state.embedder()?;

    let mut count = 0usize;
    let mut failed = Vec::new();

    for doc in &request.documents {
        if let Err(e) = validate_document(doc) {
            warn!(namespace = %request.namespace, id = %doc.id, error = %e, "rejected document");
            failed.push(doc.id.clone());
            continue;
        }

        let embedding = match embedder.embed(&doc.text).await {
            Ok(v) => v,
            Err(e) => {
                warn!(namespace = %request.namespace, id = %doc.id, error = %e, "embedding failed");
                failed.push(doc.id.clone());
                continue;
            }
        };

        match state
            .index
            .lock()
            .upsert(&request.namespace, &doc.id, &embedding, &doc.text, &doc.context)
        {
            Ok(()) => count += 1,
            Err(e) => {
                warn!(namespace = %request.namespace, id = %doc.id, error = %e, "upsert failed");
                failed.push(doc.id.clone());
            }
        }
    }

    info!(
        namespace = %request.namespace,
        indexed = count,
        failed = failed.len(),
        "indexed documents"
    );

    Ok(Json(IndexResponse {
        status: ResponseStatus::Ok,
        count,
        failed,
    }))
}

/// `POST /clear`.
///
/// Removes every document in the namespace; absent namespaces are a no-op.
/// Namespace protection is a client-side policy; the service clears
/// whatever it is asked to.
pub async fn clear_handler(
    State(state): State<AppState>,
    Json(request): Json<ClearRequest>,
) -> Result<Json<ClearResponse>> {
    validate_namespace(&request.namespace)?;
    state.index.lock().clear(&request.namespace)?;

    Ok(Json(ClearResponse {
        status: ResponseStatus::Ok,
    }))
}
