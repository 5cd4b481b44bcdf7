use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use glimpse_core::store::EventStore;

use super::token::TokenService;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingCredential,

    #[error("authorization header must be 'Bearer <token>'")]
    MalformedCredential,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("token subject is not a valid user id")]
    MalformedSubject,
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("trackingID is required")]
    MissingParameter,

    #[error("trackingID {0:?} is not a valid UUID")]
    MalformedParameter(String),

    #[error("application not found")]
    ResourceNotFound,

    /// Reported to clients exactly like `ResourceNotFound`.
    #[error("application not found")]
    NotOwner,

    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    user_id: Uuid,
}

impl Caller {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

/// A caller proven to own the application behind `tracking_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizedApp {
    user_id: Uuid,
    tracking_id: Uuid,
}

impl AuthorizedApp {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn tracking_id(&self) -> Uuid {
        self.tracking_id
    }
}

/// Identity and ownership gates in front of every dashboard operation.
pub struct AccessGuard {
    tokens: Arc<TokenService>,
    store: Arc<dyn EventStore>,
}

impl AccessGuard {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn EventStore>) -> Self {
        Self { tokens, store }
    }

    /// Resolve an `Authorization` header value to a [`Caller`].
    pub fn authorize(&self, header: Option<&str>) -> Result<Caller, AuthError> {
        let header = header.ok_or(AuthError::MissingCredential)?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MalformedCredential)?;
        let claims = self
            .tokens
            .verify(token)
            .map_err(|_| AuthError::InvalidToken)?;
        let user_id =
            Uuid::parse_str(&claims.subject).map_err(|_| AuthError::MalformedSubject)?;
        Ok(Caller { user_id })
    }

    /// Check that `caller` owns the application named by `tracking_param`.
    pub async fn authorize_ownership(
        &self,
        caller: &Caller,
        tracking_param: Option<&str>,
    ) -> Result<AuthorizedApp, AccessError> {
        let raw = tracking_param
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AccessError::MissingParameter)?;
        let tracking_id =
            Uuid::parse_str(raw).map_err(|_| AccessError::MalformedParameter(raw.to_string()))?;

        let app = self
            .store
            .find_app_by_tracking_id(tracking_id)
            .await
            .map_err(AccessError::Storage)?
            .ok_or(AccessError::ResourceNotFound)?;

        if !app.is_owned_by(caller.user_id) {
            tracing::debug!(%tracking_id, user_id = %caller.user_id, "ownership check failed");
            return Err(AccessError::NotOwner);
        }

        Ok(AuthorizedApp {
            user_id: caller.user_id,
            tracking_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use glimpse_core::application::Application;
    use glimpse_duckdb::DuckDbBackend;

    use super::*;

    async fn guard() -> (AccessGuard, Arc<TokenService>, Arc<dyn EventStore>) {
        let tokens = Arc::new(TokenService::new("guard-test-secret"));
        let store: Arc<dyn EventStore> =
            Arc::new(DuckDbBackend::open_in_memory().expect("db"));
        (
            AccessGuard::new(tokens.clone(), store.clone()),
            tokens,
            store,
        )
    }

    #[tokio::test]
    async fn identity_gate_rejects_bad_headers() {
        let (guard, tokens, _) = guard().await;
        assert_eq!(guard.authorize(None), Err(AuthError::MissingCredential));
        assert_eq!(
            guard.authorize(Some("Token abc")),
            Err(AuthError::MalformedCredential)
        );
        assert_eq!(
            guard.authorize(Some("Bearer ")),
            Err(AuthError::MalformedCredential)
        );
        assert_eq!(
            guard.authorize(Some("Bearer nope")),
            Err(AuthError::InvalidToken)
        );

        let expired = tokens
            .issue_with_expiry(&Uuid::new_v4().to_string(), Utc::now() - Duration::minutes(1))
            .expect("issue");
        assert_eq!(
            guard.authorize(Some(&format!("Bearer {expired}"))),
            Err(AuthError::InvalidToken)
        );

        let not_uuid = tokens
            .issue_with_expiry("admin", Utc::now() + Duration::hours(1))
            .expect("issue");
        assert_eq!(
            guard.authorize(Some(&format!("Bearer {not_uuid}"))),
            Err(AuthError::MalformedSubject)
        );
    }

    #[tokio::test]
    async fn identity_gate_accepts_valid_token() {
        let (guard, tokens, _) = guard().await;
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).expect("issue");
        let caller = guard
            .authorize(Some(&format!("Bearer {token}")))
            .expect("caller");
        assert_eq!(caller.user_id(), user_id);
    }

    #[tokio::test]
    async fn ownership_gate_checks_parameter_existence_and_owner() {
        let (guard, _, store) = guard().await;
        let owner = store.upsert_user("owner@example.com").await.expect("user");
        let app = Application::new(owner, "Blog");
        assert!(store.insert_app(&app).await.expect("insert"));

        let owner_caller = Caller { user_id: owner };
        let stranger = Caller {
            user_id: Uuid::new_v4(),
        };

        assert!(matches!(
            guard.authorize_ownership(&owner_caller, None).await,
            Err(AccessError::MissingParameter)
        ));
        assert!(matches!(
            guard.authorize_ownership(&owner_caller, Some("")).await,
            Err(AccessError::MissingParameter)
        ));
        assert!(matches!(
            guard.authorize_ownership(&owner_caller, Some("abc")).await,
            Err(AccessError::MalformedParameter(ref raw)) if raw == "abc"
        ));
        let unknown = Uuid::new_v4().to_string();
        assert!(matches!(
            guard.authorize_ownership(&owner_caller, Some(&unknown)).await,
            Err(AccessError::ResourceNotFound)
        ));
        let tracking = app.tracking_id.to_string();
        assert!(matches!(
            guard.authorize_ownership(&stranger, Some(&tracking)).await,
            Err(AccessError::NotOwner)
        ));

        let authorized = guard
            .authorize_ownership(&owner_caller, Some(&tracking))
            .await
            .expect("authorized");
        assert_eq!(authorized.tracking_id(), app.tracking_id);
        assert_eq!(authorized.user_id(), owner);
    }
}
