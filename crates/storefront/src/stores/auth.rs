//! Signed-in visitor state.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::api::{ApiClient, ApiError};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{AuthSession, session_keys};

/// Tokens and profile of the signed-in visitor, if any.
#[derive(Clone)]
pub struct AuthStore {
    session: Session,
}

impl AuthStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Stored auth state, without contacting the API.
    pub async fn current(&self) -> Option<AuthSession> {
        match self.session.get::<AuthSession>(session_keys::AUTH).await {
            Ok(auth) => auth,
            Err(e) => {
                tracing::warn!("Failed to load auth session, treating as signed out: {e}");
                None
            }
        }
    }

    /// Store a fresh sign-in.
    ///
    /// The session id is cycled so a pre-login cookie cannot be replayed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn sign_in(&self, auth: &AuthSession) -> Result<(), tower_sessions::session::Error> {
        self.session.cycle_id().await?;
        self.save(auth).await?;
        set_sentry_user(&auth.user.id, Some(&auth.user.email));
        Ok(())
    }

    /// Drop tokens and profile. Cart and player are untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn sign_out(&self) -> Result<(), tower_sessions::session::Error> {
        self.session
            .remove::<serde_json::Value>(session_keys::AUTH)
            .await?;
        clear_sentry_user();
        Ok(())
    }

    /// Replace the stored tokens and profile of an existing sign-in.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self, auth: &AuthSession) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(session_keys::AUTH, auth).await
    }

    /// Re-check the stored tokens against the API.
    ///
    /// Fetches the profile; on 401 tries a single token refresh and fetches
    /// again. A rejected refresh signs the visitor out. Transport failures
    /// keep the stored state so a flaky API does not log anyone out.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn verify(
        &self,
        api: &ApiClient,
    ) -> Result<Option<AuthSession>, tower_sessions::session::Error> {
        let Some(mut auth) = self.current().await else {
            return Ok(None);
        };

        match api.current_user(auth.access()).await {
            Ok(user) => {
                auth.user = user;
                self.save(&auth).await?;
                return Ok(Some(auth));
            }
            Err(ApiError::Unauthorized) => {
                tracing::debug!("Access token rejected, refreshing");
            }
            Err(e) => {
                tracing::warn!("Failed to verify session, keeping stored profile: {e}");
                return Ok(Some(auth));
            }
        }

        let refreshed = match api.refresh_token(&auth.tokens.refresh).await {
            Ok(access) => access,
            Err(e) => {
                tracing::info!("Token refresh failed, signing out: {e}");
                self.sign_out().await?;
                return Ok(None);
            }
        };
        auth.tokens.access = refreshed;

        match api.current_user(auth.access()).await {
            Ok(user) => {
                auth.user = user;
                self.save(&auth).await?;
                Ok(Some(auth))
            }
            Err(ApiError::Unauthorized) => {
                tracing::info!("Refreshed token rejected, signing out");
                self.sign_out().await?;
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Failed to reload profile after refresh: {e}");
                self.save(&auth).await?;
                Ok(Some(auth))
            }
        }
    }
}

impl<S> FromRequestParts<S> for AuthStore
where
    S: Send + Sync,
{
    type Rejection = <Session as FromRequestParts<S>>::Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self::new(session))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stores::test_support::session;
    use proffmusic_core::{TokenPair, User, UserId};

    fn auth() -> AuthSession {
        AuthSession {
            tokens: TokenPair {
                access: "a".into(),
                refresh: "r".into(),
            },
            user: User {
                id: UserId::new(1),
                email: "listener@example.com".into(),
                username: None,
                first_name: String::new(),
                last_name: String::new(),
                avatar: None,
            },
        }
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let store = AuthStore::new(session());
        assert!(store.current().await.is_none());

        store.sign_in(&auth()).await.unwrap();
        let current = store.current().await.unwrap();
        assert_eq!(current.user.email, "listener@example.com");
        assert_eq!(current.access(), "a");

        store.sign_out().await.unwrap();
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_keeps_cart() {
        let session = session();
        session.insert(session_keys::CART, vec![0_u8; 0]).await.unwrap();
        let store = AuthStore::new(session.clone());
        store.sign_in(&auth()).await.unwrap();
        store.sign_out().await.unwrap();
        assert!(
            session
                .get::<serde_json::Value>(session_keys::CART)
                .await
                .unwrap()
                .is_some()
        );
    }
}
