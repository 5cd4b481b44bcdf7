use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{auth::Caller, error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AppNameRequest {
    pub name: String,
}

/// `GET /apps`: the caller's applications, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list_apps(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<impl IntoResponse, AppError> {
    let apps = state.apps.list_apps(&caller).await?;
    Ok(Json(json!({ "data": apps })))
}

/// `POST /apps`: create an application.
#[tracing::instrument(skip(state, req))]
pub async fn create_app(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(req): Json<AppNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let app = state.apps.create_app(&caller, &req.name).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": app }))))
}

/// `PATCH /apps/{trackingID}`: rename an application the caller owns.
#[tracing::instrument(skip(state, req))]
pub async fn update_app(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(tracking_id): Path<String>,
    Json(req): Json<AppNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let authorized = state
        .guard
        .authorize_ownership(&caller, Some(&tracking_id))
        .await?;
    let app = state.apps.update_app(&authorized, &req.name).await?;
    Ok(Json(json!({ "data": app })))
}

/// `DELETE /apps/{trackingID}`: delete an application and all its events.
#[tracing::instrument(skip(state))]
pub async fn delete_app(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(tracking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let authorized = state
        .guard
        .authorize_ownership(&caller, Some(&tracking_id))
        .await?;
    state.apps.delete_app(&authorized).await?;
    Ok(StatusCode::NO_CONTENT)
}
