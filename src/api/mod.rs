// HTTP surface: login, current member, health.

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{
    AuthError, Authentication, BearerTokenInterceptor, HandlerResponse, JwtTokenProvider,
    MemberPrincipal, MemberStore, PipelineControl, TokenAuthenticationInterceptor,
};

/// Route answered by the login interceptor.
pub const LOGIN_TOKEN_PATH: &str = "/login/token";

/// Upper bound on a login body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

pub type LoginInterceptor = TokenAuthenticationInterceptor<MemberStore, Arc<JwtTokenProvider>>;
pub type MemberBearerInterceptor = BearerTokenInterceptor<Arc<JwtTokenProvider>, MemberPrincipal>;

#[derive(Clone)]
pub struct AppState {
    pub login: Arc<LoginInterceptor>,
    pub bearer: Arc<MemberBearerInterceptor>,
}

impl AppState {
    pub fn new(members: MemberStore, token_provider: JwtTokenProvider) -> Self {
        let token_provider = Arc::new(token_provider);
        Self {
            login: Arc::new(TokenAuthenticationInterceptor::new(
                members,
                token_provider.clone(),
            )),
            bearer: Arc::new(BearerTokenInterceptor::new(token_provider)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let login = Router::new()
        .route(LOGIN_TOKEN_PATH, post(login_not_intercepted))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            token_authentication,
        ));

    let members = Router::new()
        .route("/members/me", get(find_my_info))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            bearer_authentication,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(login)
        .merge(members)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Bind `bind` and serve the router until the process is stopped.
pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("auth-gate listening on http://{}", bind);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        (self.status, [(CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

/// Maps interceptor failures to transport responses.
///
/// Unknown member and wrong password share one status and body.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::MalformedRequest(_) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_REQUEST", self.to_string())
            }
            AuthError::AuthenticationFailed => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_FAILED",
                self.to_string(),
            ),
            AuthError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", self.to_string())
            }
            AuthError::SigningFailure(msg) => {
                tracing::error!("Token signing failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SIGNING_FAILURE",
                    "Token could not be issued".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}

async fn token_authentication(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AuthError::MalformedRequest(e.to_string()))?;

    match state.login.pre_handle(&bytes).await? {
        PipelineControl::ShortCircuit(response) => Ok(response.into_response()),
        PipelineControl::Continue => {
            Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
        }
    }
}

async fn bearer_authentication(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (mut parts, body) = request.into_parts();

    match state.bearer.pre_handle(&mut parts)? {
        PipelineControl::ShortCircuit(response) => Ok(response.into_response()),
        PipelineControl::Continue => Ok(next.run(Request::from_parts(parts, body)).await),
    }
}

/// Route target for [`LOGIN_TOKEN_PATH`].
///
/// Not reached in practice: the login interceptor answers every request on
/// this route, either with a token or with an error.
async fn login_not_intercepted() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn find_my_info(request: Request) -> Result<Json<MemberPrincipal>, AuthError> {
    request
        .extensions()
        .get::<Authentication<MemberPrincipal>>()
        .map(|auth| Json(auth.principal().clone()))
        .ok_or(AuthError::AuthenticationFailed)
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
