//! Request interceptors.
//!
//! Both interceptors run before a route handler and answer with a
//! [`PipelineControl`]: either let the request through or answer it here.
//! Failures come back as [`AuthError`] for the surrounding error handler to
//! turn into a response; no interceptor writes an error body itself.

use std::marker::PhantomData;

use http::header::{AUTHORIZATION, HeaderValue};
use http::request::Parts;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::auth::context::Authentication;
use crate::auth::extractor::{AuthError, AuthenticationToken, convert};
use crate::auth::jwt::TokenProvider;
use crate::auth::user_details::{UserDetails, UserDetailsService};

/// Content type of every response written by an interceptor.
pub const APPLICATION_JSON: &str = "application/json";

/// Body returned on a successful login: `{"token": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Framework-neutral response written by an interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl HandlerResponse {
    /// 200 with a JSON body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status: StatusCode::OK,
            content_type: APPLICATION_JSON,
            body: serde_json::to_string(value)?,
        })
    }
}

/// Outcome of an interceptor that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineControl {
    /// Hand the request on to the next handler.
    Continue,
    /// The request is fully handled; write this response and stop.
    ShortCircuit(HandlerResponse),
}

/// Principal type produced by a user details service.
pub type PrincipalOf<S> = <<S as UserDetailsService>::User as UserDetails>::Principal;

/// Login interceptor: credentials in, signed token out.
pub struct TokenAuthenticationInterceptor<S, P> {
    user_details_service: S,
    token_provider: P,
}

impl<S, P> TokenAuthenticationInterceptor<S, P>
where
    S: UserDetailsService,
    P: TokenProvider,
{
    pub fn new(user_details_service: S, token_provider: P) -> Self {
        Self {
            user_details_service,
            token_provider,
        }
    }

    /// Get reference to the user details service.
    pub fn user_details_service(&self) -> &S {
        &self.user_details_service
    }

    /// Parse a login body into a credential pair.
    pub fn convert(&self, body: &[u8]) -> Result<AuthenticationToken, AuthError> {
        convert(body)
    }

    /// Check a credential pair against the user details service.
    ///
    /// An unknown username and a wrong password produce the same error.
    pub async fn authenticate(
        &self,
        token: AuthenticationToken,
    ) -> Result<Authentication<PrincipalOf<S>>, AuthError> {
        let user = self
            .user_details_service
            .load_user_by_username(token.principal().as_str())
            .await;

        match user {
            Some(user) if user.check_password(token.credentials().expose()) => {
                Ok(Authentication::new(user.principal().clone()))
            }
            _ => {
                warn!("Authentication failed for principal: {}", token.principal());
                Err(AuthError::AuthenticationFailed)
            }
        }
    }

    /// Sign the authenticated principal and wrap it in a [`TokenResponse`].
    pub fn issue_token(
        &self,
        authentication: &Authentication<PrincipalOf<S>>,
    ) -> Result<TokenResponse, AuthError> {
        let payload = serde_json::to_string(authentication.principal())
            .map_err(|e| AuthError::SigningFailure(format!("payload serialization: {}", e)))?;

        let token = self.token_provider.create_token(&payload).inspect_err(|e| {
            error!("Token provider failed: {}", e);
        })?;

        Ok(TokenResponse {
            token: token.into_inner(),
        })
    }

    /// Run the full login flow for one request body.
    ///
    /// On success the request is answered here and never reaches a handler.
    pub async fn pre_handle(&self, body: &[u8]) -> Result<PipelineControl, AuthError> {
        let token = self.convert(body)?;
        let authentication = self.authenticate(token).await?;
        let response = self.issue_token(&authentication)?;

        let response = HandlerResponse::json(&response)
            .map_err(|e| AuthError::SigningFailure(format!("response serialization: {}", e)))?;

        debug!("Issued access token");
        Ok(PipelineControl::ShortCircuit(response))
    }
}

/// Bearer interceptor: attaches the token's principal to the request.
///
/// Requests without an `Authorization` header pass through untouched, so
/// handlers decide whether an identity is required.
pub struct BearerTokenInterceptor<P, T> {
    token_provider: P,
    _principal: PhantomData<fn() -> T>,
}

impl<P, T> BearerTokenInterceptor<P, T>
where
    P: TokenProvider,
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(token_provider: P) -> Self {
        Self {
            token_provider,
            _principal: PhantomData,
        }
    }

    pub fn pre_handle(&self, parts: &mut Parts) -> Result<PipelineControl, AuthError> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(PipelineControl::Continue);
        };

        let token = bearer_token(header)
            .ok_or_else(|| AuthError::InvalidToken("expected a Bearer token".to_string()))?;

        if !self.token_provider.validate_token(token) {
            return Err(AuthError::InvalidToken(
                "signature or expiry check failed".to_string(),
            ));
        }

        let payload = self.token_provider.get_payload(token)?;
        let principal: T = serde_json::from_str(&payload)
            .map_err(|e| AuthError::InvalidToken(format!("unreadable payload: {}", e)))?;

        parts.extensions.insert(Authentication::new(principal));
        Ok(PipelineControl::Continue)
    }
}

fn bearer_token(header: &HeaderValue) -> Option<&str> {
    header
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
