//! Publisher session identity.

use alloy::primitives::Address;

/// The authenticated publisher: a bearer token and the set of ledger keys
/// under the publisher's control. Loaded once per session and read-only to
/// the engines.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub email: Option<String>,
    token: Option<String>,
    pub keys: Vec<Address>,
}

impl Identity {
    pub fn new(email: Option<String>, token: Option<String>, keys: Vec<Address>) -> Self {
        Identity { email, token, keys }
    }

    /// An anonymous identity, usable for verification only.
    pub fn anonymous() -> Self {
        Identity::default()
    }

    /// Whether a session token is present. Registry-side token validation
    /// happens at login time; per-call gating is a local presence check so
    /// that argument validation can fail before any network interaction.
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}
