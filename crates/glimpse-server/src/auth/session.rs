use thiserror::Error;

use glimpse_core::store::EventStore;

use super::token::{TokenError, TokenService};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0:?} is not a valid email address")]
    InvalidEmail(String),

    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Upsert the user behind `email` and issue an identity token for them.
pub async fn sign_in(
    store: &dyn EventStore,
    tokens: &TokenService,
    email: &str,
) -> Result<String, SessionError> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(SessionError::InvalidEmail(email));
    }
    let user_id = store
        .upsert_user(&email)
        .await
        .map_err(SessionError::Storage)?;
    tracing::info!(%user_id, "issued identity token");
    Ok(tokens.issue(user_id)?)
}

#[cfg(test)]
mod tests {
    use glimpse_duckdb::DuckDbBackend;
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn sign_in_is_stable_per_normalized_email() {
        let store = DuckDbBackend::open_in_memory().expect("db");
        let tokens = TokenService::new("session-secret");

        let first = sign_in(&store, &tokens, "Ada@Example.com ").await.expect("token");
        let second = sign_in(&store, &tokens, "ada@example.com").await.expect("token");

        let a = tokens.verify(&first).expect("claims").subject;
        let b = tokens.verify(&second).expect("claims").subject;
        assert_eq!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[tokio::test]
    async fn sign_in_rejects_addresses_without_at() {
        let store = DuckDbBackend::open_in_memory().expect("db");
        let tokens = TokenService::new("session-secret");
        assert!(matches!(
            sign_in(&store, &tokens, "nobody").await,
            Err(SessionError::InvalidEmail(_))
        ));
    }
}
