//! Authentication route handlers.
//!
//! Handles login, registration and logout against the music API's JWT
//! endpoints. Tokens and the profile are kept in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::Result;
use crate::filters;
use crate::middleware::{Layout, OptionalAuth};
use crate::models::AuthSession;
use crate::state::AppState;
use crate::stores::AuthStore;

const WRONG_CREDENTIALS: &str = "Wrong login or password";
const PASSWORD_MISMATCH: &str = "Passwords do not match";
const REGISTRATION_FAILED: &str = "Registration failed";

/// Where visitors land after signing in.
const PROFILE_PATH: &str = "/profile";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Exchange credentials for tokens and load the profile.
async fn authenticate(
    state: &AppState,
    email: &str,
    password: &SecretString,
) -> std::result::Result<AuthSession, ApiError> {
    let tokens = state.api().obtain_token(email, password).await?;
    let user = state.api().current_user(&tokens.access).await?;
    Ok(AuthSession { tokens, user })
}

/// Message shown for a rejected registration, most specific first.
fn registration_error(err: &ApiError) -> String {
    err.field_message("email")
        .map(|m| format!("Email: {m}"))
        .or_else(|| err.field_message("password").map(|m| format!("Password: {m}")))
        .or_else(|| err.field_message("detail"))
        .unwrap_or_else(|| REGISTRATION_FAILED.to_string())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Signed-in visitors go straight to the profile.
#[instrument(skip_all)]
pub async fn login_page(OptionalAuth(auth): OptionalAuth, layout: Layout) -> Response {
    if auth.is_some() {
        return Redirect::to(PROFILE_PATH).into_response();
    }
    LoginTemplate {
        layout,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    store: AuthStore,
    layout: Layout,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_string();
    let password = SecretString::from(form.password);

    match authenticate(&state, &email, &password).await {
        Ok(auth) => {
            store.sign_in(&auth).await?;
            tracing::info!(user_id = %auth.user.id, "User signed in");
            Ok(Redirect::to(PROFILE_PATH).into_response())
        }
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            let error = e
                .field_message("detail")
                .unwrap_or_else(|| WRONG_CREDENTIALS.to_string());
            Ok(LoginTemplate {
                layout,
                email,
                error: Some(error),
            }
            .into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip_all)]
pub async fn register_page(OptionalAuth(auth): OptionalAuth, layout: Layout) -> Response {
    if auth.is_some() {
        return Redirect::to(PROFILE_PATH).into_response();
    }
    RegisterTemplate {
        layout,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle registration form submission.
///
/// A successful registration signs the visitor in immediately.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    store: AuthStore,
    layout: Layout,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let email = form.email.trim().to_string();
    let render = |error: String| {
        RegisterTemplate {
            layout: layout.clone(),
            email: email.clone(),
            error: Some(error),
        }
        .into_response()
    };

    let password = SecretString::from(form.password);
    let password_confirm = SecretString::from(form.password_confirm);
    if password.expose_secret() != password_confirm.expose_secret() {
        return Ok(render(PASSWORD_MISMATCH.to_string()));
    }

    if let Err(e) = state
        .api()
        .register(&email, &password, &password_confirm)
        .await
    {
        tracing::warn!("Registration failed: {e}");
        return Ok(render(registration_error(&e)));
    }
    tracing::info!("Account registered");

    match authenticate(&state, &email, &password).await {
        Ok(auth) => {
            store.sign_in(&auth).await?;
            Ok(Redirect::to(PROFILE_PATH).into_response())
        }
        Err(e) => {
            tracing::warn!("Sign-in after registration failed: {e}");
            Ok(Redirect::to("/login").into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out. Cart and player are kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
#[instrument(skip_all)]
pub async fn logout(store: AuthStore) -> Result<Redirect> {
    store.sign_out().await?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_error_order() {
        let err = ApiError::from_response(
            400,
            r#"{"password": ["This password is too common."], "email": ["user with this email already exists."]}"#,
        );
        assert_eq!(
            registration_error(&err),
            "Email: user with this email already exists."
        );

        let err = ApiError::from_response(400, r#"{"password": ["Too short."]}"#);
        assert_eq!(registration_error(&err), "Password: Too short.");

        let err = ApiError::from_response(400, r#"{"detail": "Throttled."}"#);
        assert_eq!(registration_error(&err), "Throttled.");

        let err = ApiError::from_response(500, "oops");
        assert_eq!(registration_error(&err), REGISTRATION_FAILED);
    }
}
