//! Session-related types.
//!
//! Everything the visitor's browser would otherwise keep in local storage
//! lives in the server-side session under one of the [`keys`].

use serde::{Deserialize, Serialize};

use proffmusic_core::{TokenPair, User};

/// Signed-in visitor: the JWT pair and the profile it belongs to.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub tokens: TokenPair,
    pub user: User,
}

impl AuthSession {
    /// Bearer token for authenticated API calls.
    #[must_use]
    pub fn access(&self) -> &str {
        &self.tokens.access
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("tokens", &self.tokens)
            .field("user", &self.user.id)
            .finish()
    }
}

/// Session keys for persisted visitor state.
pub mod keys {
    /// Cart contents.
    pub const CART: &str = "proffmusic-cart";

    /// Player state (current track, playlist, volume).
    pub const PLAYER: &str = "proffmusic-player";

    /// Tokens and profile of the signed-in user.
    pub const AUTH: &str = "proffmusic-auth";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proffmusic_core::UserId;

    #[test]
    fn test_debug_hides_tokens() {
        let session = AuthSession {
            tokens: TokenPair {
                access: "secret-access".into(),
                refresh: "secret-refresh".into(),
            },
            user: User {
                id: UserId::new(7),
                email: "a@b.co".into(),
                username: None,
                first_name: String::new(),
                last_name: String::new(),
                avatar: None,
            },
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("REDACTED"));
    }
}
