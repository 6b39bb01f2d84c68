//! Login, registration, logout and the profile page.

use proffmusic_integration_tests::fake_api::{AVATAR_PATH, BAD_CREDENTIALS, KNOWN_EMAIL};
use proffmusic_integration_tests::{TestApp, location};

#[tokio::test]
async fn test_profile_requires_login() {
    let app = TestApp::spawn().await;
    let response = app.get("/profile").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_wrong_password_shows_api_detail() {
    let app = TestApp::spawn().await;
    let response = app
        .post_form("/login", &[("email", KNOWN_EMAIL), ("password", "nope")])
        .await;
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains(BAD_CREDENTIALS));
    assert!(body.contains(KNOWN_EMAIL));
}

#[tokio::test]
async fn test_login_profile_and_logout() {
    let app = TestApp::spawn().await;
    app.login().await;

    let body = app.page("/profile").await;
    assert!(body.contains(KNOWN_EMAIL));
    assert!(body.contains("Morning Light"));
    assert!(body.contains("14.03.2026"));

    // Signed-in visitors skip the login form.
    let response = app.get("/login").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/profile");

    let response = app.post_form("/logout", &[]).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/");
    assert_eq!(location(&app.get("/profile").await), "/login");
}

#[tokio::test]
async fn test_logout_keeps_cart() {
    let app = TestApp::spawn().await;
    app.login().await;
    app.post_form("/cart/add", &[("kind", "track"), ("slug", "night-drive")])
        .await;
    app.post_form("/logout", &[]).await;

    assert!(app.page("/cart").await.contains("Night Drive"));
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let app = TestApp::spawn().await;
    app.login().await;
    app.api.expire_access_token();

    let body = app.page("/profile").await;
    assert!(body.contains(KNOWN_EMAIL));
    // Order history was fetched with the refreshed token.
    assert!(body.contains("14.03.2026"));
}

#[tokio::test]
async fn test_revoked_tokens_sign_out() {
    let app = TestApp::spawn().await;
    app.login().await;

    // With the refresh token rejected too, the next check signs out.
    app.api.revoke_tokens();
    let response = app.get("/profile").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_register_password_mismatch() {
    let app = TestApp::spawn().await;
    let response = app
        .post_form(
            "/register",
            &[
                ("email", "new@example.com"),
                ("password", "long-enough-1"),
                ("password_confirm", "long-enough-2"),
            ],
        )
        .await;
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Passwords do not match"));
    assert!(app.api.recorded().registrations.is_empty());
}

#[tokio::test]
async fn test_register_surfaces_field_errors() {
    let app = TestApp::spawn().await;
    let response = app
        .post_form(
            "/register",
            &[
                ("email", KNOWN_EMAIL),
                ("password", "long-enough-1"),
                ("password_confirm", "long-enough-1"),
            ],
        )
        .await;
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Email: user with this email already exists."));

    let recorded = app.api.recorded();
    assert_eq!(recorded.registrations[0]["username"], KNOWN_EMAIL);
    assert_eq!(recorded.registrations[0]["re_password"], "long-enough-1");
}

/// Smallest valid PNG: signature plus IHDR, IDAT and IEND chunks.
const PNG_1X1: [u8; 67] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

#[tokio::test]
async fn test_avatar_rejects_non_images() {
    let app = TestApp::spawn().await;
    app.login().await;

    let response = app
        .upload_avatar("text/plain", b"hello".to_vec())
        .await;
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Avatar must be a JPEG, PNG, WebP or GIF image"));
    assert!(app.api.recorded().avatar_uploads.is_empty());
}

#[tokio::test]
async fn test_avatar_rejects_empty_file() {
    let app = TestApp::spawn().await;
    app.login().await;

    let response = app.upload_avatar("image/png", Vec::new()).await;
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap_or_default();
    assert!(body.contains("Choose an image to upload"));
    assert!(app.api.recorded().avatar_uploads.is_empty());
}

#[tokio::test]
async fn test_avatar_upload_updates_profile() {
    let app = TestApp::spawn().await;
    app.login().await;

    let response = app.upload_avatar("image/png", PNG_1X1.to_vec()).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/profile");
    assert_eq!(app.api.recorded().avatar_uploads.len(), 1);

    let body = app.page("/profile").await;
    assert!(body.contains(&format!("{}{AVATAR_PATH}", app.api.origin())));
}

#[tokio::test]
async fn test_avatar_upload_requires_login() {
    let app = TestApp::spawn().await;
    let response = app.upload_avatar("image/png", PNG_1X1.to_vec()).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/login");
}
