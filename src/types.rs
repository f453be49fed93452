//! NewType wrappers for the values that cross the authentication boundary.
//!
//! The principal, the secret and the issued token each get their own type so
//! a password can never be passed where a username is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

newtype_string!(
    /// Login name presented by the caller (the member's email address).
    ///
    /// Content is unvalidated: it may be empty or not look like an email at
    /// all. Lookups must cope with arbitrary values.
    Username
);

newtype_string!(
    /// Signed token handed back to the caller after a successful login.
    ///
    /// Opaque to everything except the token provider that produced it.
    AccessToken
);

/// Secret half of a credential pair.
///
/// Not serializable. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    /// Create a new instance.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret for comparison against a stored hash.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_creation() {
        let name = Username::new("a@b.com");
        assert_eq!(name.as_str(), "a@b.com");
        assert_eq!(name.to_string(), "a@b.com");
    }

    #[test]
    fn test_username_from_string() {
        let name: Username = "a@b.com".into();
        assert_eq!(name.as_str(), "a@b.com");

        let name: Username = String::from("c@d.com").into();
        assert_eq!(name.into_inner(), "c@d.com");
    }

    #[test]
    fn test_access_token_serde() {
        let token = AccessToken::new("header.payload.signature");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"header.payload.signature\"");

        let parsed: AccessToken = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let secret = Credentials::new("hunter2");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("hunter2"));
        assert_eq!(secret.expose(), "hunter2");
    }
}
