//! Authenticated identity for the current request.

/// Identity that has passed a credential or token check.
///
/// Only this crate can construct one, and it only does so after a successful
/// password check or a verified bearer token. It is stored in request
/// extensions for downstream handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct Authentication<P> {
    principal: P,
}

impl<P> Authentication<P> {
    pub(crate) fn new(principal: P) -> Self {
        Self { principal }
    }

    /// Get the authenticated principal.
    pub fn principal(&self) -> &P {
        &self.principal
    }

    /// Consume and return the principal.
    pub fn into_principal(self) -> P {
        self.principal
    }
}
