use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use glimpse_core::error::{QueryError, WindowError};

use crate::apps::AppsError;
use crate::auth::session::SessionError;
use crate::auth::{AccessError, AuthError};
use crate::ingest::IngestError;

/// Application-level errors that map directly to HTTP responses.
///
/// Every component error converts into one of these, so handlers can return
/// `Result<impl IntoResponse, AppError>` and use `?` throughout.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest {
        message: String,
        field: Option<&'static str>,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, field: Option<&'static str>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            field,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, field) = match &self {
            AppError::BadRequest { message, field } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message.clone(),
                *field,
            ),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone(), None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            AppError::Unavailable(e) => {
                tracing::error!("Storage unavailable: {e:#}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    "Storage temporarily unavailable, retry later".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "field": field
                }
            })),
        )
            .into_response()
    }
}

impl From<WindowError> for AppError {
    fn from(e: WindowError) -> Self {
        let field = match e {
            WindowError::IncompleteRange | WindowError::RangeInverted | WindowError::RangeEmpty => {
                None
            }
            WindowError::InvalidDateFormat(_) => Some("date"),
        };
        AppError::bad_request(e.to_string(), field)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Unauthorized(e.to_string())
    }
}

impl From<AccessError> for AppError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::MissingParameter | AccessError::MalformedParameter(_) => {
                AppError::bad_request(e.to_string(), Some("trackingID"))
            }
            AccessError::ResourceNotFound | AccessError::NotOwner => {
                AppError::NotFound(e.to_string())
            }
            AccessError::Storage(inner) => AppError::Internal(inner),
        }
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::InvalidEncoding | IngestError::InvalidPayload(_) => {
                AppError::bad_request(e.to_string(), Some("data"))
            }
            IngestError::UnknownApplication(_) => AppError::NotFound(e.to_string()),
            IngestError::StorageFailure(inner) => AppError::Unavailable(inner),
            IngestError::GeoResolutionFailed(_) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

impl From<AppsError> for AppError {
    fn from(e: AppsError) -> Self {
        match e {
            AppsError::InvalidName => AppError::bad_request(e.to_string(), Some("name")),
            AppsError::AppExists(_) => AppError::Conflict(e.to_string()),
            AppsError::Storage(inner) => AppError::Internal(inner),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::InvalidEmail(_) => AppError::bad_request(e.to_string(), Some("email")),
            SessionError::Storage(inner) => AppError::Internal(inner),
            SessionError::Token(_) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}
