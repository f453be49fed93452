//! Identity lookup seam.
//!
//! The interceptor depends only on these two traits. `MemberStore` is the
//! in-memory implementation used by the server; tests plug in their own.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A stored identity that can check a presented password.
pub trait UserDetails: Send + Sync {
    /// Public view of the identity. Must not contain the secret; it becomes
    /// the token payload.
    type Principal: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Returns `true` if `credentials` matches the stored secret.
    ///
    /// Implementations should compare in constant time.
    fn check_password(&self, credentials: &str) -> bool;

    /// Returns the principal representation of this identity.
    fn principal(&self) -> &Self::Principal;
}

/// Resolves a username to a stored identity.
pub trait UserDetailsService: Send + Sync {
    type User: UserDetails;

    /// Look up an identity by username.
    ///
    /// Must accept arbitrary input. An unknown username is `None`, never an
    /// error.
    fn load_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Option<Self::User>> + Send;
}
