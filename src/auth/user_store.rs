//! Member storage and password hashing.

use std::collections::HashMap;
use std::sync::LazyLock;

use anyhow::Result;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

use crate::auth::user_details::{UserDetails, UserDetailsService};
use crate::config::MemberConfig;

/// Public representation of a member, used as the token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPrincipal {
    pub id: u64,
    pub email: String,
    pub age: Option<u32>,
}

/// A member as loaded for login: principal plus Argon2id PHC hash.
#[derive(Clone)]
pub struct LoginMember {
    principal: MemberPrincipal,
    password_hash: String,
}

impl LoginMember {
    /// Create a member from an already hashed password.
    pub fn new(
        id: u64,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        age: Option<u32>,
    ) -> Self {
        Self {
            principal: MemberPrincipal {
                id,
                email: email.into(),
                age,
            },
            password_hash: password_hash.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.principal.email
    }
}

impl std::fmt::Debug for LoginMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginMember")
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

impl From<MemberConfig> for LoginMember {
    fn from(cfg: MemberConfig) -> Self {
        Self::new(cfg.id, cfg.email, cfg.password_hash, cfg.age)
    }
}

impl UserDetails for LoginMember {
    type Principal = MemberPrincipal;

    fn check_password(&self, credentials: &str) -> bool {
        match verify_password(credentials, &self.password_hash) {
            Ok(matched) => matched,
            Err(e) => {
                warn!("Stored hash for member {} is unusable: {}", self.principal.id, e);
                false
            }
        }
    }

    fn principal(&self) -> &MemberPrincipal {
        &self.principal
    }
}

/// In-memory member store keyed by email.
#[derive(Default)]
pub struct MemberStore {
    members: RwLock<HashMap<String, LoginMember>>,
}

impl MemberStore {
    /// Create an empty member store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given members.
    pub fn with_members(members: impl IntoIterator<Item = LoginMember>) -> Self {
        let members = members
            .into_iter()
            .map(|m| (m.email().to_string(), m))
            .collect();
        Self {
            members: RwLock::new(members),
        }
    }

    /// Insert or replace a member.
    pub async fn insert(&self, member: LoginMember) {
        self.members
            .write()
            .await
            .insert(member.email().to_string(), member);
    }

    /// Number of stored members.
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}

impl UserDetailsService for MemberStore {
    type User = LoginMember;

    /// A miss still pays for one Argon2id verification, so unknown and known
    /// emails take the same time to reject.
    async fn load_user_by_username(&self, username: &str) -> Option<LoginMember> {
        let member = self.members.read().await.get(username).cloned();
        if member.is_none() {
            verify_unknown_member(username);
        }
        member
    }
}

/// Hash with the same parameters as stored member hashes.
static UNKNOWN_MEMBER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("auth-gate:unknown-member").ok());

/// Run a full verification against [`UNKNOWN_MEMBER_HASH`]. Always `false`.
fn verify_unknown_member(candidate: &str) -> bool {
    let Some(hash) = UNKNOWN_MEMBER_HASH.as_deref() else {
        warn!("Unknown-member hash unavailable; lookup miss is not time-padded");
        return false;
    };
    let _ = verify_password(candidate, hash);
    false
}

/// Hash a password using Argon2id with a random salt.
///
/// Returns a PHC-formatted string suitable for the members file.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a PHC hash.
///
/// `Ok(false)` on mismatch; `Err` only if the stored hash cannot be parsed
/// or the verifier itself fails.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(password: &str) -> LoginMember {
        LoginMember::new(1, "a@b.com", hash_password(password).unwrap(), Some(10))
    }

    #[test]
    fn test_hash_password_is_salted() {
        let hash1 = hash_password("pw1").unwrap();
        let hash2 = hash_password("pw1").unwrap();

        assert!(hash1.starts_with("$argon2id$"));
        assert_ne!(hash1, hash2);
        assert!(verify_password("pw1", &hash1).unwrap());
        assert!(verify_password("pw1", &hash2).unwrap());
    }

    #[test]
    fn test_verify_password_mismatch() {
        let hash = hash_password("pw1").unwrap();
        assert!(!verify_password("wrong", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_bad_hash() {
        assert!(verify_password("pw1", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_login_member_check_password() {
        let m = member("pw1");
        assert!(m.check_password("pw1"));
        assert!(!m.check_password("pw2"));
    }

    #[test]
    fn test_login_member_with_corrupt_hash_never_matches() {
        let m = LoginMember::new(1, "a@b.com", "plaintext", None);
        assert!(!m.check_password("plaintext"));
    }

    #[test]
    fn test_principal_excludes_password() {
        let m = member("pw1");
        let json = serde_json::to_value(m.principal()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"id": 1, "email": "a@b.com", "age": 10})
        );
        assert!(!format!("{:?}", m).contains("argon2"));
    }

    #[test]
    fn test_member_from_config() {
        let cfg = MemberConfig {
            id: 7,
            email: "c@d.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            age: None,
        };
        let m = LoginMember::from(cfg);
        assert_eq!(m.principal().id, 7);
        assert_eq!(m.email(), "c@d.com");
        assert_eq!(m.principal().age, None);
    }

    #[tokio::test]
    async fn test_member_store_lookup() {
        let store = MemberStore::with_members([member("pw1")]);

        let found = store.load_user_by_username("a@b.com").await;
        assert!(found.is_some());
        assert!(found.unwrap().check_password("pw1"));

        assert!(store.load_user_by_username("ghost@b.com").await.is_none());
        assert!(store.load_user_by_username("").await.is_none());
    }

    #[test]
    fn test_unknown_member_hash_is_argon2id() {
        let hash = UNKNOWN_MEMBER_HASH.as_deref().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordHash::new(hash).is_ok());
    }

    #[test]
    fn test_verify_unknown_member_never_matches() {
        assert!(!verify_unknown_member("auth-gate:unknown-member"));
        assert!(!verify_unknown_member(""));
        assert!(!verify_unknown_member("pw1"));
    }

    #[tokio::test]
    async fn test_lookup_miss_pays_for_a_verification() {
        let store = MemberStore::with_members([member("pw1")]);
        // Build the shared hash outside the timed section.
        assert!(UNKNOWN_MEMBER_HASH.is_some());

        let started = std::time::Instant::now();
        assert!(store.load_user_by_username("ghost@b.com").await.is_none());
        let miss = started.elapsed();

        let started = std::time::Instant::now();
        let _ = verify_password("x", UNKNOWN_MEMBER_HASH.as_deref().unwrap());
        let verify = started.elapsed();

        assert!(
            miss * 4 >= verify,
            "miss took {:?}, one verification takes {:?}",
            miss,
            verify
        );
    }

    #[tokio::test]
    async fn test_member_store_insert_replaces() {
        let store = MemberStore::new();
        assert!(store.is_empty().await);

        store.insert(member("pw1")).await;
        store.insert(member("pw2")).await;
        assert_eq!(store.len().await, 1);

        let found = store.load_user_by_username("a@b.com").await.unwrap();
        assert!(found.check_password("pw2"));
        assert!(!found.check_password("pw1"));
    }
}
