//! JWT session token handling

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Issuer embedded in every session token.
pub const ISSUER: &str = "certdepot";

/// Audience embedded in every session token.
pub const AUDIENCE: &str = "certdepot-web";

/// How long a login session stays valid.
pub const SESSION_VALIDITY_HOURS: i64 = 12;

/// Error types for JWT operations
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Invalid or expired token: {0}")]
    ValidationFailed(String),
}

/// Claims carried by a login session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Login name, echoed back into page greetings
    pub username: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

impl SessionClaims {
    pub fn new(user_id: String, username: String, validity: Duration) -> Self {
        let now = Utc::now();
        let exp = now + validity;

        Self {
            sub: user_id,
            username,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
        }
    }

    /// Claims for a standard login session.
    pub fn for_session(user_id: String, username: String) -> Self {
        Self::new(user_id, username, Duration::hours(SESSION_VALIDITY_HOURS))
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Validates session tokens against a shared HS256 secret
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        validation.set_issuer(&[ISSUER]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Encode claims into a signed token string.
    pub fn encode(secret: &[u8], claims: &SessionClaims) -> Result<String, JwtError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Validate signature, expiration, issuer, and audience, returning the
    /// claims on success.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, JwtError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::ValidationFailed(e.to_string()))
    }
}
