//! Health and status endpoints.
//!
//! `/health` is polled by the launcher during startup, so it must stay
//! side-effect free and cheap. `/status` adds per-namespace document
//! counts for diagnostics.

use std::collections::BTreeMap;

use axum::{Json, extract::State};

use mnemo_types::{HealthResponse, HealthStatus, ResponseStatus, StatusResponse};

use crate::error::Result;
use crate::state::AppState;

/// `GET /health`.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let collections = state.index.lock().namespaces()?;
    let status = if state.model_failed() {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    Ok(Json(HealthResponse {
        status,
        model_loaded: state.model_loaded(),
        collections,
    }))
}

/// `GET /status`.
pub async fn status_handler(State(state): State<AppState>) -> Result<Json<StatusResponse>> {
    let (collections, document_counts) = {
        let index = state.index.lock();
        let collections = index.namespaces()?;
        let mut counts = BTreeMap::new();
        for ns in &collections {
            counts.insert(ns.clone(), index.count(ns)?);
        }
        (collections, counts)
    };

    Ok(Json(StatusResponse {
        status: ResponseStatus::Ok,
        model: state.model_name(),
        collections,
        document_counts,
    }))
}
