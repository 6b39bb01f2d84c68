//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (new releases + library, ?page=n)
//! GET  /music                  - Catalog with filter sidebar
//! GET  /tracks/{slug}          - Track detail + related tracks
//! GET  /collections            - Collection listing
//! GET  /collections/{slug}     - Collection detail
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add a track or collection (idempotent)
//! POST /cart/remove            - Remove by (type, id)
//!
//! # Checkout
//! GET  /checkout               - Checkout form (empty cart redirects home)
//! POST /checkout               - Create order, redirect to payment page
//! GET  /success                - Payment landing page, clears the cart
//! GET  /mock-payment           - Payment emulator (only when enabled)
//! POST /mock-payment           - Send payment.succeeded webhook
//!
//! # Player
//! POST /player/play            - Play a track from a listing
//! POST /player/toggle          - Toggle play/pause
//! POST /player/pause           - Pause
//! POST /player/resume          - Resume
//! POST /player/next            - Next track in the playlist
//! POST /player/prev            - Previous track in the playlist
//! POST /player/volume          - Set volume
//! GET  /player/state           - Player state as JSON
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /register               - Register page
//! POST /register               - Register action
//! POST /logout                 - Logout action
//!
//! # Account (requires auth)
//! GET  /profile                - Profile and order history
//! POST /profile/avatar         - Avatar upload
//!
//! # Pages
//! GET  /about, /contacts, /license
//!
//! # Health
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (pings the music API)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod collections;
pub mod health;
pub mod home;
pub mod pages;
pub mod payment;
pub mod player;
pub mod tracks;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};

use crate::middleware::{action_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Headroom for multipart framing around the avatar file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Accept a form's `return_to` only if it is a path on this site.
///
/// Rejects absolute URLs, scheme-relative `//host` paths and backslashes
/// (some browsers treat `/\host` as `//host`).
#[must_use]
pub fn safe_return_to(return_to: Option<&str>) -> Option<&str> {
    return_to
        .map(str::trim)
        .filter(|path| path.starts_with('/') && !path.starts_with("//") && !path.contains('\\'))
}

/// 303 back to `return_to` when it is local, otherwise to `fallback`.
#[must_use]
pub fn local_redirect(return_to: Option<&str>, fallback: &str) -> Redirect {
    Redirect::to(safe_return_to(return_to).unwrap_or(fallback))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/music", get(catalog::index))
        .route("/tracks/{slug}", get(tracks::show))
        .route("/collections", get(collections::index))
        .route("/collections/{slug}", get(collections::show))
}

/// Create the auth routes router.
///
/// Only the credential posts are rate limited; both share one budget.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/login",
            post(auth::login)
                .layer(limiter.clone())
                .get(auth::login_page),
        )
        .route(
            "/register",
            post(auth::register)
                .layer(limiter)
                .get(auth::register_page),
        )
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the player routes router.
pub fn player_routes() -> Router<AppState> {
    Router::new()
        .route("/play", post(player::play))
        .route("/toggle", post(player::toggle))
        .route("/pause", post(player::pause))
        .route("/resume", post(player::resume))
        .route("/next", post(player::next))
        .route("/prev", post(player::prev))
        .route("/volume", post(player::volume))
        .route("/state", get(player::state))
}

/// Create the checkout routes router.
///
/// The payment emulator is only mounted when `mock_payments` is enabled.
pub fn checkout_routes(mock_payments: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .route("/success", get(checkout::success));

    if mock_payments {
        router.route("/mock-payment", get(payment::show).post(payment::confirm))
    } else {
        router
    }
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::profile))
        .route(
            "/avatar",
            post(account::upload_avatar).layer(DefaultBodyLimit::max(
                account::AVATAR_MAX_BYTES + MULTIPART_OVERHEAD,
            )),
        )
}

/// Create all routes for the storefront.
pub fn routes(state: &AppState) -> Router<AppState> {
    // Rate-limited form actions
    let actions = Router::new()
        .nest("/cart", cart_routes())
        .nest("/player", player_routes())
        .merge(checkout_routes(state.config().mock_payments))
        .layer(action_rate_limiter());

    Router::new()
        .merge(catalog_routes())
        .merge(auth_routes())
        .merge(actions)
        .nest("/profile", account_routes())
        .merge(pages::router())
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_to_accepts_local_paths() {
        assert_eq!(safe_return_to(Some("/music?page=2")), Some("/music?page=2"));
        assert_eq!(safe_return_to(Some(" /cart ")), Some("/cart"));
        assert_eq!(safe_return_to(Some("/")), Some("/"));
    }

    #[test]
    fn test_safe_return_to_rejects_foreign_targets() {
        assert_eq!(safe_return_to(None), None);
        assert_eq!(safe_return_to(Some("")), None);
        assert_eq!(safe_return_to(Some("https://evil.example")), None);
        assert_eq!(safe_return_to(Some("//evil.example")), None);
        assert_eq!(safe_return_to(Some("/\\evil.example")), None);
        assert_eq!(safe_return_to(Some("music")), None);
    }

    #[test]
    fn test_local_redirect_is_see_other() {
        use axum::http::{StatusCode, header};
        use axum::response::IntoResponse;

        let response = local_redirect(Some("//evil.example"), "/cart").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/cart");
    }
}
