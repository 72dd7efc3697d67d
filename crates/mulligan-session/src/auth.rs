//! Profile validation: turning a credential token into a verified identity.
//!
//! Mulligan doesn't validate credentials itself — that belongs to the
//! profile service the game operator runs. This module defines the
//! [`ProfileStore`] trait: one async call that resolves a login token into
//! a [`Profile`] or fails. The server calls it during the login handshake
//! and compares the resolved identity against the identity the client
//! claimed; a mismatch closes the connection.
//!
//! Implementations range from an HTTP client against the real profile
//! service to the in-memory [`StaticProfiles`] used by tests and demos.

use std::collections::HashMap;

use mulligan_protocol::PlayerId;

use crate::SessionError;

/// A validated player profile, as the profile service knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// The identity the token actually belongs to.
    pub id: PlayerId,
    /// The profile's registered display name.
    pub name: String,
}

/// Resolves a login token to the profile it was issued for.
///
/// `Send + Sync + 'static` because the server shares one store across all
/// connection tasks for its whole lifetime. The returned future must be
/// `Send` for the same reason — it may be polled from any runtime thread.
pub trait ProfileStore: Send + Sync + 'static {
    /// Validates the given token and returns the owning profile.
    ///
    /// # Errors
    /// Returns [`SessionError::AuthFailed`] when the token is unknown,
    /// expired, or rejected by the backing service.
    fn retrieve(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Profile, SessionError>> + Send;
}

/// An in-memory token → profile table.
///
/// Backs tests and the demo server; a real deployment implements
/// [`ProfileStore`] against its actual profile service instead.
#[derive(Debug, Default, Clone)]
pub struct StaticProfiles {
    profiles: HashMap<String, Profile>,
}

impl StaticProfiles {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` as belonging to the given identity and name.
    pub fn with_profile(
        mut self,
        token: &str,
        id: &str,
        name: &str,
    ) -> Self {
        self.profiles.insert(
            token.to_string(),
            Profile {
                id: PlayerId::from(id),
                name: name.to_string(),
            },
        );
        self
    }
}

impl ProfileStore for StaticProfiles {
    async fn retrieve(&self, token: &str) -> Result<Profile, SessionError> {
        self.profiles.get(token).cloned().ok_or_else(|| {
            SessionError::AuthFailed("unknown login token".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_profiles_resolves_known_token() {
        let store = StaticProfiles::new().with_profile("t1", "u1", "Ann");

        let profile = store.retrieve("t1").await.expect("known token");

        assert_eq!(profile.id, PlayerId::from("u1"));
        assert_eq!(profile.name, "Ann");
    }

    #[tokio::test]
    async fn test_static_profiles_rejects_unknown_token() {
        let store = StaticProfiles::new().with_profile("t1", "u1", "Ann");

        let result = store.retrieve("t2").await;

        assert!(matches!(result, Err(SessionError::AuthFailed(_))));
    }
}
