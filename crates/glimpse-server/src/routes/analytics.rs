//! Dashboard report endpoints under `/analytics`.
//!
//! Every handler takes an [`AuthorizedApp`], so identity and ownership are
//! settled before any window parsing or storage access happens.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use glimpse_core::window::{normalize_window, RequestWindow};

use crate::{auth::AuthorizedApp, error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

impl WindowQuery {
    fn window(&self, app: &AuthorizedApp) -> Result<RequestWindow, AppError> {
        Ok(normalize_window(
            app.tracking_id(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )?)
    }
}

#[tracing::instrument(skip(state))]
pub async fn referrals(
    State(state): State<Arc<AppState>>,
    app: AuthorizedApp,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window(&app)?;
    let data = state.analytics.get_referrals(&window).await?;
    Ok(Json(json!({ "data": data })))
}

#[tracing::instrument(skip(state))]
pub async fn pages(
    State(state): State<Arc<AppState>>,
    app: AuthorizedApp,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window(&app)?;
    let data = state.analytics.get_pages(&window).await?;
    Ok(Json(json!({ "data": data })))
}

#[tracing::instrument(skip(state))]
pub async fn browsers(
    State(state): State<Arc<AppState>>,
    app: AuthorizedApp,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window(&app)?;
    let data = state.analytics.get_browsers(&window).await?;
    Ok(Json(json!({ "data": data })))
}

#[tracing::instrument(skip(state))]
pub async fn countries(
    State(state): State<Arc<AppState>>,
    app: AuthorizedApp,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window(&app)?;
    let data = state.analytics.get_countries(&window).await?;
    Ok(Json(json!({ "data": data })))
}

#[tracing::instrument(skip(state))]
pub async fn devices(
    State(state): State<Arc<AppState>>,
    app: AuthorizedApp,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window(&app)?;
    let data = state.analytics.get_devices(&window).await?;
    Ok(Json(json!({ "data": data })))
}

#[tracing::instrument(skip(state))]
pub async fn operating_systems(
    State(state): State<Arc<AppState>>,
    app: AuthorizedApp,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window(&app)?;
    let data = state.analytics.get_operating_systems(&window).await?;
    Ok(Json(json!({ "data": data })))
}

/// Series responses also carry the bucket size the window resolved to.
#[tracing::instrument(skip(state))]
pub async fn visitors(
    State(state): State<Arc<AppState>>,
    app: AuthorizedApp,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window(&app)?;
    let data = state.analytics.get_visitors(&window).await?;
    Ok(Json(json!({ "data": data, "bucket": window.bucket() })))
}

#[tracing::instrument(skip(state))]
pub async fn page_views(
    State(state): State<Arc<AppState>>,
    app: AuthorizedApp,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let window = query.window(&app)?;
    let data = state.analytics.get_page_views(&window).await?;
    Ok(Json(json!({ "data": data, "bucket": window.bucket() })))
}
