//! Account calls: JWT issuance, registration, profile and order history.
//!
//! None of these are cached. Calls that need a signed-in user take the
//! access token explicitly; the client itself is shared by all visitors.

use proffmusic_core::{Listing, OrderSummary, TokenPair, User};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::client::parse;
use super::{ApiClient, ApiError};

/// An image file destined for `/users/upload_avatar/`.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Deserialize)]
struct RefreshedAccess {
    access: String,
}

impl ApiClient {
    /// Exchange credentials for a JWT pair.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` (usually 401 with a `detail`) for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn obtain_token(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<TokenPair, ApiError> {
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        self.post_json(self.endpoint("auth/jwt/create/")?, &body, None)
            .await
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns error if the refresh token is expired or rejected.
    #[instrument(skip_all)]
    pub async fn refresh_token(&self, refresh: &str) -> Result<String, ApiError> {
        let body = json!({ "refresh": refresh });
        let refreshed: RefreshedAccess = self
            .post_json(self.endpoint("auth/jwt/refresh/")?, &body, None)
            .await?;
        Ok(refreshed.access)
    }

    /// Create an account. The email doubles as the username.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with per-field messages on validation failure.
    #[instrument(skip(self, password, re_password))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
        re_password: &SecretString,
    ) -> Result<(), ApiError> {
        let body = json!({
            "email": email,
            "username": email,
            "password": password.expose_secret(),
            "re_password": re_password.expose_secret(),
        });
        self.post_json_discard(self.endpoint("auth/users/")?, &body, None)
            .await
    }

    /// Profile of the token's owner.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is expired or invalid.
    #[instrument(skip_all)]
    pub async fn current_user(&self, access: &str) -> Result<User, ApiError> {
        let mut user: User = self
            .get_json(self.endpoint("auth/users/me/")?, Some(access))
            .await?;
        user.resolve_media(self.media_origin());
        Ok(user)
    }

    /// Replace the user's avatar; returns the updated profile.
    ///
    /// # Errors
    ///
    /// Returns error if the upload is rejected or the token is invalid.
    #[instrument(skip(self, access, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload_avatar(&self, access: &str, upload: AvatarUpload) -> Result<User, ApiError> {
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)?;
        let form = Form::new().part("avatar", part);

        let request = self
            .request(Method::POST, self.endpoint("users/upload_avatar/")?, Some(access))
            .multipart(form);
        let body = self.send(request, true).await?;
        let mut user: User = parse(&body)?;
        user.resolve_media(self.media_origin());
        Ok(user)
    }

    /// Paid orders of the token's owner, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is expired or invalid.
    #[instrument(skip_all)]
    pub async fn order_history(&self, access: &str) -> Result<Vec<OrderSummary>, ApiError> {
        let listing: Listing<OrderSummary> = self
            .get_json(self.endpoint("users/orders/")?, Some(access))
            .await?;
        Ok(listing.into_items())
    }
}
