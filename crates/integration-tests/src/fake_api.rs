//! In-process stand-in for the ProffMusic REST API.
//!
//! Serves a small fixed catalog and one known account, and records every
//! order and payment notification it receives so tests can inspect them.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// The account the fake API knows from the start.
pub const KNOWN_EMAIL: &str = "buyer@example.com";
pub const KNOWN_PASSWORD: &str = "correct-horse";

/// Access token issued at login.
pub const ACCESS_TOKEN: &str = "access-1";
/// Access token issued by a refresh.
pub const REFRESHED_ACCESS_TOKEN: &str = "access-2";
pub const REFRESH_TOKEN: &str = "refresh-1";

/// Where the fake checkout sends buyers.
pub const PAYMENT_URL: &str = "https://pay.example.com/checkout/42";

/// Avatar path the fake stores after any accepted upload.
pub const AVATAR_PATH: &str = "/media/avatars/anna.png";

/// `detail` returned for bad credentials.
pub const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

/// Everything the storefront sent that tests may want to look at.
#[derive(Debug, Default)]
pub struct Recorded {
    /// Raw query strings of `GET /tracks/`.
    pub track_queries: Vec<String>,
    /// Checkout bodies with the bearer token they carried.
    pub checkouts: Vec<(Value, Option<String>)>,
    pub notifications: Vec<Value>,
    pub registrations: Vec<Value>,
    /// Body sizes of avatar uploads.
    pub avatar_uploads: Vec<usize>,
}

#[derive(Default)]
struct FakeState {
    recorded: Mutex<Recorded>,
    users: Mutex<Vec<String>>,
    avatar: Mutex<Option<String>>,
    /// When set, every authenticated call answers 401.
    revoke_tokens: Mutex<bool>,
    /// When set, only the login access token is rejected; refresh still works.
    expire_access: Mutex<bool>,
}

/// Handle on a running fake API.
#[derive(Clone)]
pub struct FakeApi {
    pub address: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeApi {
    /// Start the fake API on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::expect_used)]
    pub async fn spawn() -> Self {
        let state = Arc::new(FakeState::default());
        state
            .users
            .lock()
            .expect("users lock")
            .push(KNOWN_EMAIL.to_string());

        let router = Router::new()
            .route("/api/categories/", get(categories))
            .route("/api/tags/", get(tags))
            .route("/api/tracks/", get(list_tracks))
            .route("/api/tracks/{slug}/", get(get_track))
            .route("/api/collections/", get(list_collections))
            .route("/api/collections/{slug}/", get(get_collection))
            .route("/api/auth/jwt/create/", post(obtain_token))
            .route("/api/auth/jwt/refresh/", post(refresh_token))
            .route("/api/auth/users/", post(register))
            .route("/api/auth/users/me/", get(me))
            .route("/api/users/orders/", get(orders))
            .route("/api/users/upload_avatar/", post(upload_avatar))
            .route("/api/orders/checkout/", post(checkout))
            .route("/api/orders/webhook/", post(webhook))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake API");
        let address = listener.local_addr().expect("fake API address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { address, state }
    }

    /// API root as the storefront expects it.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.address)
    }

    /// Origin relative media paths resolve against.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Snapshot access to the recorded requests.
    ///
    /// # Panics
    ///
    /// Panics if a fake handler panicked while holding the lock.
    #[allow(clippy::expect_used)]
    pub fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.state.recorded.lock().expect("recorded lock")
    }

    /// Make every token the API issued so far invalid.
    ///
    /// # Panics
    ///
    /// Panics if a fake handler panicked while holding the lock.
    #[allow(clippy::expect_used)]
    pub fn revoke_tokens(&self) {
        *self.state.revoke_tokens.lock().expect("revoke lock") = true;
    }

    /// Expire the access token issued at login, as its lifetime running out would.
    ///
    /// # Panics
    ///
    /// Panics if a fake handler panicked while holding the lock.
    #[allow(clippy::expect_used)]
    pub fn expire_access_token(&self) {
        *self.state.expire_access.lock().expect("expire lock") = true;
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn category(slug: &str) -> Value {
    match slug {
        "cinematic" => json!({"id": 1, "name": "Cinematic", "slug": "cinematic"}),
        _ => json!({"id": 2, "name": "Lo-fi", "slug": "lofi"}),
    }
}

fn tag_list() -> Value {
    json!([
        {"id": 1, "name": "Calm", "slug": "calm", "tag_type": "mood"},
        {"id": 2, "name": "Piano", "slug": "piano", "tag_type": "instrument"},
        {"id": 3, "name": "YouTube", "slug": "youtube", "tag_type": "usage"}
    ])
}

fn all_tracks() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "title": "Morning Light",
            "slug": "morning-light",
            "price": "1500.00",
            "cover_image": "/media/covers/morning-light.jpg",
            "audio_file_preview": "/media/previews/morning-light.mp3",
            "duration": "00:02:05",
            "category": category("cinematic"),
            "tags": [
                {"id": 1, "name": "Calm", "slug": "calm", "tag_type": "mood"},
                {"id": 2, "name": "Piano", "slug": "piano", "tag_type": "instrument"}
            ],
            "description_short": "A slow piano sunrise.",
            "description_full": "",
            "is_new": true
        }),
        json!({
            "id": 2,
            "title": "Night Drive",
            "slug": "night-drive",
            "price": "990.00",
            "cover_image": null,
            "audio_file_preview": "/media/previews/night-drive.mp3",
            "duration": "00:03:10",
            "category": category("lofi"),
            "tags": [],
            "is_new": false
        }),
        json!({
            "id": 3,
            "title": "Quiet Room",
            "slug": "quiet-room",
            "price": "750.50",
            "audio_file_preview": null,
            "duration": "00:01:40",
            "category": category("cinematic"),
            "tags": [{"id": 1, "name": "Calm", "slug": "calm", "tag_type": "mood"}],
            "is_new": false
        }),
    ]
}

fn find_track(slug: &str) -> Option<Value> {
    all_tracks().into_iter().find(|t| t["slug"] == slug)
}

fn focus_pack() -> Value {
    json!({
        "id": 7,
        "title": "Focus Pack",
        "slug": "focus-pack",
        "price": "2000.00",
        "cover_image": "/media/covers/focus-pack.jpg",
        "description": "Two tracks for deep work.",
        "tracks": [find_track("morning-light"), find_track("night-drive")],
        "is_new": true
    })
}

fn user(email: &str, avatar: Option<&str>) -> Value {
    json!({
        "id": 11,
        "email": email,
        "username": email,
        "first_name": "Anna",
        "last_name": "",
        "avatar": avatar
    })
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Given token not valid for any token type"})),
    )
        .into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn authorized(state: &FakeState, headers: &HeaderMap) -> bool {
    let revoked = state.revoke_tokens.lock().map(|r| *r).unwrap_or(false);
    let expired = state.expire_access.lock().map(|e| *e).unwrap_or(false);
    !revoked
        && bearer(headers).is_some_and(|token| {
            (token == ACCESS_TOKEN && !expired) || token == REFRESHED_ACCESS_TOKEN
        })
}

// =============================================================================
// Catalog
// =============================================================================

async fn categories() -> Json<Value> {
    Json(json!([category("cinematic"), category("lofi")]))
}

async fn tags() -> Json<Value> {
    Json(tag_list())
}

async fn list_tracks(
    State(state): State<Arc<FakeState>>,
    RawQuery(raw): RawQuery,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    if let Ok(mut recorded) = state.recorded.lock() {
        recorded.track_queries.push(raw.unwrap_or_default());
    }

    let tags: Vec<&str> = params
        .get("tags__slug")
        .map(|t| t.split(',').collect())
        .unwrap_or_default();

    let results: Vec<Value> = all_tracks()
        .into_iter()
        .filter(|t| {
            params
                .get("category__slug")
                .is_none_or(|c| t["category"]["slug"] == c.as_str())
        })
        .filter(|t| params.get("is_new").is_none_or(|v| t["is_new"] == (v == "true")))
        .filter(|t| {
            params.get("search").is_none_or(|q| {
                t["title"]
                    .as_str()
                    .is_some_and(|title| title.to_lowercase().contains(&q.to_lowercase()))
            })
        })
        .filter(|t| {
            tags.iter().all(|slug| {
                t["tags"]
                    .as_array()
                    .is_some_and(|list| list.iter().any(|tag| tag["slug"] == *slug))
            })
        })
        .collect();

    Json(json!({
        "count": results.len(),
        "next": null,
        "previous": null,
        "results": results
    }))
}

async fn get_track(Path(slug): Path<String>) -> Response {
    find_track(&slug).map_or_else(not_found, |t| Json(t).into_response())
}

async fn list_collections() -> Json<Value> {
    Json(json!({"count": 1, "next": null, "previous": null, "results": [focus_pack()]}))
}

async fn get_collection(Path(slug): Path<String>) -> Response {
    if slug == "focus-pack" {
        Json(focus_pack()).into_response()
    } else {
        not_found()
    }
}

// =============================================================================
// Accounts
// =============================================================================

async fn obtain_token(Json(body): Json<Value>) -> Response {
    if body["email"] == KNOWN_EMAIL && body["password"] == KNOWN_PASSWORD {
        Json(json!({"access": ACCESS_TOKEN, "refresh": REFRESH_TOKEN})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": BAD_CREDENTIALS}))).into_response()
    }
}

async fn refresh_token(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Response {
    let revoked = state.revoke_tokens.lock().map(|r| *r).unwrap_or(false);
    if !revoked && body["refresh"] == REFRESH_TOKEN {
        Json(json!({"access": REFRESHED_ACCESS_TOKEN})).into_response()
    } else {
        unauthorized()
    }
}

async fn register(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Response {
    if let Ok(mut recorded) = state.recorded.lock() {
        recorded.registrations.push(body.clone());
    }

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let Ok(mut users) = state.users.lock() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    if users.contains(&email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"email": ["user with this email already exists."]})),
        )
            .into_response();
    }
    if body["password"].as_str().is_none_or(|p| p.len() < 8) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"password": ["This password is too short."]})),
        )
            .into_response();
    }
    users.push(email.clone());
    (StatusCode::CREATED, Json(json!({"id": 12, "email": email}))).into_response()
}

async fn me(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let avatar = state.avatar.lock().ok().and_then(|a| a.clone());
    Json(user(KNOWN_EMAIL, avatar.as_deref())).into_response()
}

async fn orders(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(json!([{
        "id": "3f2b8c1e-0000-4000-8000-000000000042",
        "amount": "1500.00",
        "created_at": "2026-03-14T10:00:00Z",
        "items_display": ["Morning Light"]
    }]))
    .into_response()
}

async fn upload_avatar(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if let Ok(mut recorded) = state.recorded.lock() {
        recorded.avatar_uploads.push(body.len());
    }
    if let Ok(mut avatar) = state.avatar.lock() {
        *avatar = Some(AVATAR_PATH.to_string());
    }
    Json(user(KNOWN_EMAIL, Some(AVATAR_PATH))).into_response()
}

// =============================================================================
// Orders
// =============================================================================

async fn checkout(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let token = bearer(&headers);
    if token.is_some() && !authorized(&state, &headers) {
        return unauthorized();
    }
    if let Ok(mut recorded) = state.recorded.lock() {
        recorded.checkouts.push((body.clone(), token));
    }

    if body["items"].as_array().is_none_or(Vec::is_empty) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Cart is empty"}))).into_response();
    }
    Json(json!({
        "order_id": "3f2b8c1e-0000-4000-8000-000000000042",
        "payment_url": PAYMENT_URL
    }))
    .into_response()
}

async fn webhook(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Json<Value> {
    if let Ok(mut recorded) = state.recorded.lock() {
        recorded.notifications.push(body);
    }
    Json(json!({"status": "ok"}))
}
