//! Session-backed visitor stores.
//!
//! Cart, player and auth state live in the visitor's server-side session,
//! one JSON value per key. A value that fails to load (store error or a
//! payload from an older shape) is treated as empty state.

pub mod auth;
pub mod cart;
pub mod player;

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Serialize, de::DeserializeOwned};
use tower_sessions::Session;

pub use auth::AuthStore;
pub use cart::CartStore;
pub use player::PlayerStore;

/// A value persisted in the session under a fixed key.
pub trait Persisted: Serialize + DeserializeOwned + Default + Send + Sync {
    const KEY: &'static str;
}

/// Typed access to one [`Persisted`] value in the session.
pub struct SessionStore<T> {
    session: Session,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for SessionStore<T> {
    fn clone(&self) -> Self {
        Self::from_session(self.session.clone())
    }
}

impl<T> SessionStore<T> {
    const fn from_session(session: Session) -> Self {
        Self {
            session,
            _value: PhantomData,
        }
    }
}

impl<T: Persisted> SessionStore<T> {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self::from_session(session)
    }

    /// Current value, or the default when absent or unreadable.
    pub async fn load(&self) -> T {
        match self.session.get::<T>(T::KEY).await {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(key = T::KEY, "Failed to load session value, resetting: {e}");
                T::default()
            }
        }
    }

    /// Replace the stored value.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self, value: &T) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(T::KEY, value).await
    }

    /// Load, mutate and save in one step. Returns the saved value and the
    /// closure's result.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn update<R: Send>(
        &self,
        f: impl FnOnce(&mut T) -> R + Send,
    ) -> Result<(T, R), tower_sessions::session::Error> {
        let mut value = self.load().await;
        let result = f(&mut value);
        self.save(&value).await?;
        Ok((value, result))
    }
}

impl<S, T> FromRequestParts<S> for SessionStore<T>
where
    S: Send + Sync,
    T: Persisted,
{
    type Rejection = <Session as FromRequestParts<S>>::Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self::new(session))
    }
}
