use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Query, State},
    http::{request::Parts, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    #[serde(default)]
    pub data: String,
}

/// Best-effort client address: `X-Forwarded-For` (first entry), then
/// `X-Real-IP`, then the TCP peer when the server was started with
/// connect info. Empty when none of these is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Ok(ClientIp(extract_client_ip(&parts.headers, peer)))
    }
}

pub fn extract_client_ip(headers: &HeaderMap, peer: Option<String>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or(peer)
        .unwrap_or_default()
}

/// `GET /analytics/track?data=<base64>`: public tracking beacon.
///
/// No authentication. The beacon only has to name an existing tracking id.
#[tracing::instrument(skip(state, query))]
pub async fn track(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    Query(query): Query<TrackQuery>,
) -> Result<impl IntoResponse, AppError> {
    if query.data.trim().is_empty() {
        return Err(AppError::bad_request("data is required", Some("data")));
    }
    state.ingest.ingest(&query.data, &client_ip).await?;
    Ok(Json(json!({ "data": { "ok": true } })))
}
