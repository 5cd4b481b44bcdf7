use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifetime of an issued identity token.
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, wrong algorithm, malformed token, or expired.
    #[error("invalid token")]
    InvalidToken,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// The only claims the rest of the server sees after verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 identity tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token for `user_id` expiring [`TOKEN_TTL_HOURS`] from now.
    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_with_expiry(
            &user_id.to_string(),
            Utc::now() + Duration::hours(TOKEN_TTL_HOURS),
        )
    }

    pub(crate) fn issue_with_expiry(
        &self,
        subject: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            TokenError::InvalidToken
        })?;
        let expires_at =
            DateTime::from_timestamp(data.claims.exp, 0).ok_or(TokenError::InvalidToken)?;
        Ok(VerifiedClaims {
            subject: data.claims.sub,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-0123456789abcdef";

    #[test]
    fn issue_then_verify_round_trips_subject() {
        let service = TokenService::new(SECRET);
        let user_id = Uuid::new_v4();
        let token = service.issue(user_id).expect("issue");
        let claims = service.verify(&token).expect("verify");
        assert_eq!(claims.subject, user_id.to_string());
        let ttl = claims.expires_at - Utc::now();
        assert!(ttl <= Duration::hours(24) && ttl > Duration::hours(23));
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new(SECRET);
        let token = service
            .issue_with_expiry("someone", Utc::now() - Duration::seconds(5))
            .expect("issue");
        assert!(matches!(
            service.verify(&token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = TokenService::new("another-secret")
            .issue(Uuid::new_v4())
            .expect("issue");
        assert!(matches!(
            TokenService::new(SECRET).verify(&token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("encode");
        assert!(matches!(
            TokenService::new(SECRET).verify(&token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            TokenService::new(SECRET).verify("not.a.token"),
            Err(TokenError::InvalidToken)
        ));
    }
}
