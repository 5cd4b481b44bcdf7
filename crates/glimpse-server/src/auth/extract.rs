//! Axum extractors producing [`Caller`] and [`AuthorizedApp`] for handlers.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use serde::Deserialize;

use super::{AuthError, AuthorizedApp, Caller};
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct TrackingParam {
    #[serde(rename = "trackingID")]
    tracking_id: Option<String>,
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(header::AUTHORIZATION) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| AuthError::MalformedCredential)?,
            ),
            None => None,
        };
        Ok(state.guard.authorize(header)?)
    }
}

/// Reads `trackingID` from the query string and checks ownership.
impl FromRequestParts<Arc<AppState>> for AuthorizedApp {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        let Query(param) = Query::<TrackingParam>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::bad_request(e.body_text(), Some("trackingID")))?;
        Ok(state
            .guard
            .authorize_ownership(&caller, param.tracking_id.as_deref())
            .await?)
    }
}
