//! Credential extraction from raw request bodies.

use std::fmt;

use crate::types::{Credentials, Username};
use serde::Deserialize;
use tracing::debug;

/// Authentication errors.
///
/// Unknown members and wrong passwords both map to `AuthenticationFailed`;
/// callers cannot tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Body could not be parsed into a credential pair
    MalformedRequest(String),
    /// Unknown principal or password mismatch
    AuthenticationFailed,
    /// Bearer token is malformed, expired or carries a bad signature
    InvalidToken(String),
    /// Token provider could not produce a token
    SigningFailure(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRequest(msg) => write!(f, "Malformed request: {}", msg),
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            Self::SigningFailure(msg) => write!(f, "Token signing failed: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// Login request body: `{"email": "...", "password": "..."}`.
#[derive(Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

/// Credential pair taken from a login request.
///
/// Lives for a single request. Its `Debug` output never shows the password.
#[derive(Debug, Clone)]
pub struct AuthenticationToken {
    principal: Username,
    credentials: Credentials,
}

impl AuthenticationToken {
    pub fn new(principal: impl Into<Username>, credentials: Credentials) -> Self {
        Self {
            principal: principal.into(),
            credentials,
        }
    }

    pub fn principal(&self) -> &Username {
        &self.principal
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl From<TokenRequest> for AuthenticationToken {
    fn from(request: TokenRequest) -> Self {
        Self::new(request.email, Credentials::new(request.password))
    }
}

/// Parse a raw request body into a credential pair.
///
/// Extra fields are ignored. Empty strings are accepted here; whether they
/// match anything is for the lookup to decide.
pub fn convert(body: &[u8]) -> Result<AuthenticationToken, AuthError> {
    let request: TokenRequest = serde_json::from_slice(body)
        .map_err(|e| AuthError::MalformedRequest(e.to_string()))?;

    let token = AuthenticationToken::from(request);
    debug!("Extracted credentials for principal: {}", token.principal());
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_reads_email_and_password() {
        let token = convert(br#"{"email":"a@b.com","password":"pw1"}"#).unwrap();
        assert_eq!(token.principal().as_str(), "a@b.com");
        assert_eq!(token.credentials().expose(), "pw1");
    }

    #[test]
    fn test_convert_ignores_extra_fields() {
        let token =
            convert(br#"{"email":"a@b.com","password":"pw1","remember":true}"#).unwrap();
        assert_eq!(token.principal().as_str(), "a@b.com");
    }

    #[test]
    fn test_convert_accepts_empty_values() {
        let token = convert(br#"{"email":"","password":""}"#).unwrap();
        assert_eq!(token.principal().as_str(), "");
        assert_eq!(token.credentials().expose(), "");
    }

    #[test]
    fn test_convert_missing_password() {
        let result = convert(br#"{"email":"a@b.com"}"#);
        assert!(matches!(result, Err(AuthError::MalformedRequest(_))));
    }

    #[test]
    fn test_convert_null_field() {
        let result = convert(br#"{"email":null,"password":"pw1"}"#);
        assert!(matches!(result, Err(AuthError::MalformedRequest(_))));
    }

    #[test]
    fn test_convert_non_json_bytes() {
        let result = convert(&[0xff, 0xfe, 0x00, 0x01]);
        assert!(matches!(result, Err(AuthError::MalformedRequest(_))));

        let result = convert(b"email=a@b.com&password=pw1");
        assert!(matches!(result, Err(AuthError::MalformedRequest(_))));
    }

    #[test]
    fn test_token_debug_hides_password() {
        let token = convert(br#"{"email":"a@b.com","password":"s3cret"}"#).unwrap();
        let printed = format!("{:?}", token);
        assert!(printed.contains("a@b.com"));
        assert!(!printed.contains("s3cret"));
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::AuthenticationFailed.to_string(),
            "Authentication failed"
        );
        assert_eq!(
            AuthError::MalformedRequest("missing field `password`".to_string()).to_string(),
            "Malformed request: missing field `password`"
        );
        assert_eq!(
            AuthError::InvalidToken("expired".to_string()).to_string(),
            "Invalid token: expired"
        );
        assert_eq!(
            AuthError::SigningFailure("bad key".to_string()).to_string(),
            "Token signing failed: bad key"
        );
    }
}
