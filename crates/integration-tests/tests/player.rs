//! Preview player actions through the JSON protocol the player script uses.

use proffmusic_integration_tests::{TestApp, location};

#[tokio::test]
async fn test_play_walks_playlist_and_stops_at_end() {
    let app = TestApp::spawn().await;

    // The catalog has three tracks; "quiet-room" has no preview and is skipped.
    let state = app
        .post_json_reply(
            "/player/play",
            &[("slug", "morning-light"), ("source", "catalog:")],
        )
        .await;
    assert_eq!(state["current"]["slug"], "morning-light");
    assert_eq!(state["is_playing"], true);
    assert_eq!(state["playlist_len"], 2);
    assert_eq!(state["has_prev"], false);

    let state = app.post_json_reply("/player/next", &[]).await;
    assert_eq!(state["current"]["slug"], "night-drive");
    assert_eq!(state["has_next"], false);

    let state = app.post_json_reply("/player/next", &[]).await;
    assert_eq!(state["current"]["slug"], "night-drive");
    assert_eq!(state["is_playing"], false);

    let state = app.post_json_reply("/player/prev", &[]).await;
    assert_eq!(state["current"]["slug"], "morning-light");
    assert_eq!(state["is_playing"], true);
}

#[tokio::test]
async fn test_play_same_track_toggles() {
    let app = TestApp::spawn().await;
    let form = [("slug", "night-drive"), ("source", "catalog:category__slug=lofi")];
    let state = app.post_json_reply("/player/play", &form).await;
    assert_eq!(state["is_playing"], true);
    assert_eq!(state["playlist_len"], 1);

    let state = app.post_json_reply("/player/play", &form).await;
    assert_eq!(state["is_playing"], false);

    let state = app.post_json_reply("/player/resume", &[]).await;
    assert_eq!(state["is_playing"], true);

    let state = app.post_json_reply("/player/pause", &[]).await;
    assert_eq!(state["is_playing"], false);
}

#[tokio::test]
async fn test_track_without_preview_cannot_play() {
    let app = TestApp::spawn().await;
    let response = app
        .post_form("/player/play", &[("slug", "quiet-room")])
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_volume_accepts_percentages() {
    let app = TestApp::spawn().await;
    let state = app.post_json_reply("/player/volume", &[("volume", "35")]).await;
    let volume = state["volume"].as_f64().unwrap_or_default();
    assert!((volume - 0.35).abs() < 1e-6);

    let state = app.post_json_reply("/player/volume", &[("volume", "0.5")]).await;
    assert_eq!(state["volume"], 0.5);
}

#[tokio::test]
async fn test_form_post_redirects_and_player_bar_renders() {
    let app = TestApp::spawn().await;
    let response = app
        .post_form(
            "/player/play",
            &[
                ("slug", "morning-light"),
                ("source", "related:morning-light"),
                ("return_to", "/tracks/morning-light"),
            ],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/tracks/morning-light");

    let body = app.page("/about").await;
    assert!(body.contains(r#"id="player-audio""#));
    assert!(body.contains(r#"data-playing="true""#));
    let preview = format!("{}/media/previews/morning-light.mp3", app.api.origin());
    assert!(body.contains(&preview));

    let state: serde_json::Value = app
        .get("/player/state")
        .await
        .json()
        .await
        .unwrap_or_default();
    // "quiet-room" shares the category but has no preview.
    assert_eq!(state["playlist_len"], 1);
}
