use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `GET /health`: liveness check plus stored totals.
///
/// `503` with `"status": "degraded"` when DuckDB cannot answer.
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    match state.db.table_counts().await {
        Ok(counts) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "version": version,
                "apps": counts.apps,
                "events": counts.events,
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check could not read DuckDB");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "version": version })),
            )
        }
    }
}
