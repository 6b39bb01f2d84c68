//! Catalog browsing: home, filters, detail pages and not-found handling.

use proffmusic_integration_tests::TestApp;

#[tokio::test]
async fn test_home_shows_new_releases_and_library() {
    let app = TestApp::spawn().await;
    let body = app.page("/").await;

    assert!(body.contains("New releases"));
    assert!(body.contains("Morning Light"));
    assert!(body.contains("Night Drive"));
    assert!(body.contains(r#"name="source" value="new""#));
    assert!(body.contains(r#"name="source" value="library:1""#));
}

#[tokio::test]
async fn test_catalog_category_filter_reaches_api() {
    let app = TestApp::spawn().await;
    let body = app.page("/music?category__slug=lofi").await;

    assert!(body.contains("Night Drive"));
    assert!(!body.contains("Quiet Room"));
    assert!(body.contains("Clear filters"));

    let recorded = app.api.recorded();
    let query = recorded
        .track_queries
        .iter()
        .find(|q| q.contains("category__slug=lofi"))
        .expect("filtered tracks request");
    assert!(query.contains("ordering=-created_at"));
}

#[tokio::test]
async fn test_catalog_sidebar_links_toggle_filters() {
    let app = TestApp::spawn().await;
    let body = app.page("/music?tags__slug=calm").await;

    // Active tag links remove themselves; the other tag is added alongside.
    assert!(body.contains(r#"href="/music""#));
    assert!(body.contains("tags__slug=calm%2Cpiano"));
    assert!(body.contains("Quiet Room"));
    assert!(!body.contains("Night Drive"));
}

#[tokio::test]
async fn test_catalog_search() {
    let app = TestApp::spawn().await;
    let body = app.page("/music?search=night").await;

    assert!(body.contains("Night Drive"));
    assert!(!body.contains("Morning Light"));
    assert!(body.contains(r#"value="night""#));
}

#[tokio::test]
async fn test_track_page_with_related_and_absolute_media() {
    let app = TestApp::spawn().await;
    let body = app.page("/tracks/morning-light").await;

    assert!(body.contains("A slow piano sunrise."));
    assert!(body.contains("Related tracks"));
    assert!(body.contains("Quiet Room"));
    let cover = format!("{}/media/covers/morning-light.jpg", app.api.origin());
    assert!(body.contains(&cover));
}

#[tokio::test]
async fn test_unknown_track_is_not_found() {
    let app = TestApp::spawn().await;
    let response = app.get("/tracks/does-not-exist").await;
    assert_eq!(response.status(), 404);

    let response = app.get("/no/such/page").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_collections() {
    let app = TestApp::spawn().await;
    let index = app.page("/collections").await;
    assert!(index.contains("Focus Pack"));

    let detail = app.page("/collections/focus-pack").await;
    assert!(detail.contains("Two tracks for deep work."));
    assert!(detail.contains(r#"value="collection:focus-pack""#));

    assert_eq!(app.get("/collections/missing").await.status(), 404);
}

#[tokio::test]
async fn test_static_pages_and_health() {
    let app = TestApp::spawn().await;
    assert!(app.page("/about").await.contains("About ProffMusic"));
    assert!(app.page("/license").await.contains("Content ID"));
    assert!(app.page("/contacts").await.contains("support@proffmusic.ru"));

    assert_eq!(app.get("/health").await.status(), 200);
    assert_eq!(app.get("/health/ready").await.status(), 200);
}

#[tokio::test]
async fn test_security_headers() {
    let app = TestApp::spawn().await;
    let response = app.get("/").await;
    let headers = response.headers();

    let policy = headers
        .get("content-security-policy")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(policy.contains(&app.api.origin()));
    assert!(policy.contains("'nonce-"));
    assert!(headers.contains_key("x-request-id"));
}
