//! Token signing and verification.
//!
//! The interceptors only see [`TokenProvider`]. [`JwtTokenProvider`] signs
//! HS256 JWTs whose `sub` claim carries the serialized principal.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::extractor::AuthError;
use crate::config::JwtConfig;
use crate::types::AccessToken;

/// Creates and verifies signed tokens around an opaque string payload.
pub trait TokenProvider: Send + Sync {
    /// Sign `payload` into a token.
    fn create_token(&self, payload: &str) -> Result<AccessToken, AuthError>;

    /// Returns `true` if the token's signature and expiry are valid.
    fn validate_token(&self, token: &str) -> bool;

    /// Extract the payload from a valid token.
    fn get_payload(&self, token: &str) -> Result<String, AuthError>;
}

impl<P: TokenProvider + ?Sized> TokenProvider for Arc<P> {
    fn create_token(&self, payload: &str) -> Result<AccessToken, AuthError> {
        (**self).create_token(payload)
    }

    fn validate_token(&self, token: &str) -> bool {
        (**self).validate_token(token)
    }

    fn get_payload(&self, token: &str) -> Result<String, AuthError> {
        (**self).get_payload(token)
    }
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Serialized principal
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// HS256 token provider with a fixed validity window.
pub struct JwtTokenProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: TimeDelta,
}

impl JwtTokenProvider {
    /// Build a provider from validated settings.
    pub fn new(config: &JwtConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let seconds = i64::try_from(config.expire_seconds)?;
        let validity = TimeDelta::try_seconds(seconds).ok_or_else(|| {
            anyhow::anyhow!("JWT expiry out of range: {} seconds", config.expire_seconds)
        })?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validity,
        })
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation
    }

    fn decode_claims(&self, token: &str) -> Result<JwtClaims, AuthError> {
        decode::<JwtClaims>(token, &self.decoding_key, &Self::validation())
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

impl TokenProvider for JwtTokenProvider {
    fn create_token(&self, payload: &str) -> Result<AccessToken, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.validity)
            .ok_or_else(|| AuthError::SigningFailure("token expiry overflows".to_string()))?;

        let claims = JwtClaims {
            sub: payload.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map(AccessToken::new)
            .map_err(|e| AuthError::SigningFailure(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> bool {
        match self.decode_claims(token) {
            Ok(_) => true,
            Err(e) => {
                debug!("Token rejected: {}", e);
                false
            }
        }
    }

    fn get_payload(&self, token: &str) -> Result<String, AuthError> {
        self.decode_claims(token).map(|claims| claims.sub)
    }
}
