use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::Session;

use super::errors::AuthError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    name: String,
    jti: Uuid,
    iat: i64,
    exp: i64,
}

/// A token that passed signature and expiry checks.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    pub session: Session,
    /// Per-issue id, used to revoke this token on logout.
    pub jti: Uuid,
    pub expires_at: i64,
}

/// Issues and verifies HS256 bearer tokens that carry a [`Session`].
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    // None when the configured lifetime does not fit a chrono Duration
    ttl: Option<Duration>,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self::build(secret, Duration::try_hours(ttl_hours))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self::build(secret, Some(ttl))
    }

    fn build(secret: &str, ttl: Option<Duration>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn expiry(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, AuthError> {
        self.ttl
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AuthError::TokenError("token lifetime out of range".into()))
    }

    pub fn issue(&self, session: &Session) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: session.id.to_string(),
            name: session.name.clone(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: self.expiry(now)?.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Check signature and expiry, returning the session plus the token's id.
    pub fn verify_token(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        let id = Uuid::parse_str(&data.claims.sub).map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(VerifiedToken {
            session: Session { id, name: data.claims.name },
            jti: data.claims.jti,
            expires_at: data.claims.exp,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Session, AuthError> {
        self.verify_token(token).map(|t| t.session)
    }
}
