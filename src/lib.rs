// Core modules
pub mod api;
pub mod auth;
pub mod config;
pub mod types;

// Re-export key types and functions
pub use api::{AppState, create_router, serve};
pub use auth::{
    AuthError, Authentication, JwtTokenProvider, LoginMember, MemberStore, PipelineControl,
    TokenAuthenticationInterceptor, TokenResponse,
};
pub use config::{JwtConfig, MemberConfig};

use anyhow::Result;
use std::path::Path;

/// Convenience function to build the application state.
///
/// Loads members from `members_path` (or the default location), checks the
/// JWT settings and wires both interceptors to one token provider.
pub fn create_state(members_path: Option<&Path>, jwt: &JwtConfig) -> Result<AppState> {
    let token_provider = JwtTokenProvider::new(jwt)?;

    let members = match members_path {
        Some(path) => config::load_members_from(path)?,
        None => config::load_members()?,
    };
    tracing::info!("Loaded {} members", members.len());

    let store = MemberStore::with_members(members.into_iter().map(LoginMember::from));
    Ok(AppState::new(store, token_provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::UserDetailsService;
    use std::io::Write;

    #[tokio::test]
    async fn test_create_state_from_members_file() {
        let hash = auth::hash_password("pw1").unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"members": [{{"id": 1, "email": "a@b.com", "password_hash": "{}"}}]}}"#,
            hash
        )
        .unwrap();

        let state = create_state(Some(file.path()), &JwtConfig::new("secret")).unwrap();
        let store = state.login.user_details_service();
        assert_eq!(store.len().await, 1);
        assert!(store.load_user_by_username("a@b.com").await.is_some());
    }

    #[test]
    fn test_create_state_rejects_empty_secret() {
        let dir = tempfile::tempdir().unwrap();
        let result = create_state(Some(&dir.path().join("members.json")), &JwtConfig::new(""));
        assert!(result.is_err());
    }

    #[test]
    fn test_create_state_rejects_unbounded_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let jwt = JwtConfig {
            expire_seconds: u64::MAX,
            ..JwtConfig::new("secret")
        };
        let result = create_state(Some(&dir.path().join("members.json")), &jwt);
        assert!(result.is_err());
    }
}
