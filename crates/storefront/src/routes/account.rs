//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use proffmusic_core::OrderSummary;
use tracing::instrument;

use crate::api::AvatarUpload;
use crate::error::Result;
use crate::filters;
use crate::middleware::{Layout, RequireAuth, UserBadge};
use crate::models::AuthSession;
use crate::state::AppState;
use crate::stores::AuthStore;

/// Largest accepted avatar file.
pub const AVATAR_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Avatar content types the API accepts.
const AVATAR_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// User display data for templates.
#[derive(Clone, Debug)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub initial: String,
    pub avatar: Option<String>,
}

impl From<&AuthSession> for ProfileView {
    fn from(auth: &AuthSession) -> Self {
        Self {
            name: auth.user.display_name(),
            email: auth.user.email.clone(),
            initial: auth.user.initial(),
            avatar: auth.user.avatar.clone(),
        }
    }
}

/// Order display data for templates.
#[derive(Clone, Debug)]
pub struct OrderView {
    pub number: String,
    pub date: String,
    pub total: String,
    pub items: Vec<String>,
}

impl From<&OrderSummary> for OrderView {
    fn from(order: &OrderSummary) -> Self {
        Self {
            number: order.short_id(),
            date: order.created_at.format("%d.%m.%Y").to_string(),
            total: order.amount.display(),
            items: order.items_display.clone(),
        }
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub profile: ProfileView,
    pub orders: Vec<OrderView>,
    pub orders_failed: bool,
    pub avatar_error: Option<String>,
}

async fn render_profile(
    state: &AppState,
    auth: &AuthSession,
    mut layout: Layout,
    avatar_error: Option<String>,
) -> ProfileTemplate {
    let (orders, orders_failed) = match state.api().order_history(auth.access()).await {
        Ok(orders) => (orders.iter().map(OrderView::from).collect(), false),
        Err(e) => {
            tracing::warn!("Failed to fetch order history: {e}");
            (Vec::new(), true)
        }
    };

    // The layout was read before the profile was re-verified.
    layout.user = Some(UserBadge {
        name: auth.user.display_name(),
        initial: auth.user.initial(),
        avatar: auth.user.avatar.clone(),
    });

    ProfileTemplate {
        layout,
        profile: ProfileView::from(auth),
        orders,
        orders_failed,
        avatar_error,
    }
}

/// Display the profile with order history.
#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    layout: Layout,
) -> ProfileTemplate {
    render_profile(&state, &auth, layout, None).await
}

const AVATAR_WRONG_TYPE: &str = "Avatar must be a JPEG, PNG, WebP or GIF image";
const AVATAR_TOO_LARGE: &str = "Avatar must be at most 5 MB";
const AVATAR_MISSING: &str = "Choose an image to upload";

fn check_avatar_type(content_type: &str) -> std::result::Result<(), String> {
    if AVATAR_CONTENT_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(AVATAR_WRONG_TYPE.to_string())
    }
}

fn check_avatar_size(len: usize) -> std::result::Result<(), String> {
    match len {
        0 => Err(AVATAR_MISSING.to_string()),
        len if len > AVATAR_MAX_BYTES => Err(AVATAR_TOO_LARGE.to_string()),
        _ => Ok(()),
    }
}

/// Read the `avatar` part of the upload form.
async fn read_avatar(multipart: &mut Multipart) -> std::result::Result<AvatarUpload, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Upload failed: {e}"))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        check_avatar_type(&content_type)?;
        let file_name = field.file_name().unwrap_or("avatar").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AVATAR_TOO_LARGE.to_string())?;
        check_avatar_size(bytes.len())?;

        return Ok(AvatarUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(AVATAR_MISSING.to_string())
}

/// Replace the avatar.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
#[instrument(skip_all)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    RequireAuth(mut auth): RequireAuth,
    store: AuthStore,
    layout: Layout,
    mut multipart: Multipart,
) -> Result<Response> {
    let upload = match read_avatar(&mut multipart).await {
        Ok(upload) => upload,
        Err(message) => {
            return Ok(render_profile(&state, &auth, layout, Some(message))
                .await
                .into_response());
        }
    };

    match state.api().upload_avatar(auth.access(), upload).await {
        Ok(user) => {
            auth.user = user;
            store.save(&auth).await?;
            Ok(Redirect::to("/profile").into_response())
        }
        Err(e) => {
            tracing::warn!("Avatar upload failed: {e}");
            let message = e
                .field_message("avatar")
                .or_else(|| e.field_message("detail"))
                .unwrap_or_else(|| "Avatar upload failed".to_string());
            Ok(render_profile(&state, &auth, layout, Some(message))
                .await
                .into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_view() {
        let order: OrderSummary = serde_json::from_value(json!({
            "id": "5b1f8c2e-9a77-4a4e-9d7f-0c2b6a1e3f10",
            "amount": "3000.00",
            "created_at": "2025-03-14T09:26:53Z",
            "items_display": ["Night Run", "Cinematic Pack"]
        }))
        .unwrap();

        let view = OrderView::from(&order);
        assert_eq!(view.number, "5b1f8c2e");
        assert_eq!(view.date, "14.03.2025");
        assert_eq!(view.total, "3000 ₽");
        assert_eq!(view.items.len(), 2);
    }

    #[test]
    fn test_avatar_size_bound() {
        assert!(check_avatar_size(1).is_ok());
        assert!(check_avatar_size(AVATAR_MAX_BYTES).is_ok());
        assert_eq!(
            check_avatar_size(AVATAR_MAX_BYTES + 1).unwrap_err(),
            AVATAR_TOO_LARGE
        );
        assert_eq!(check_avatar_size(0).unwrap_err(), AVATAR_MISSING);
    }

    #[test]
    fn test_avatar_content_types() {
        for content_type in AVATAR_CONTENT_TYPES {
            assert!(check_avatar_type(content_type).is_ok());
        }
        assert_eq!(
            check_avatar_type("text/plain").unwrap_err(),
            AVATAR_WRONG_TYPE
        );
        assert!(check_avatar_type("image/svg+xml").is_err());
    }
}
