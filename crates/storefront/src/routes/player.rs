//! Player actions.
//!
//! Plain form posts redirect back to the page they came from. The player
//! script posts the same forms with `Accept: application/json` (when a
//! preview ends, autoplay is blocked, or the volume slider moves) and gets
//! the new state back instead of a redirect.

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, header::ACCEPT},
    response::{IntoResponse, Response},
};
use proffmusic_core::{CatalogFilter, Player, PlayerTrack, Track};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::local_redirect;
use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::stores::PlayerStore;

// =============================================================================
// Forms
// =============================================================================

/// Play form data.
#[derive(Debug, Deserialize)]
pub struct PlayForm {
    /// Track to play, by slug.
    pub slug: String,
    /// Where the playlist comes from, see [`PlaylistSource`].
    #[serde(default)]
    pub source: Option<String>,
    pub return_to: Option<String>,
}

/// Form for the argument-less actions.
#[derive(Debug, Deserialize)]
pub struct ReturnForm {
    pub return_to: Option<String>,
}

/// Volume form data, `0..=100` or `0.0..=1.0`.
#[derive(Debug, Deserialize)]
pub struct VolumeForm {
    pub volume: f32,
    pub return_to: Option<String>,
}

// =============================================================================
// Playlist sources
// =============================================================================

/// The listing a play button sits in, which becomes the playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistSource {
    /// `/music` with this query string.
    Catalog(String),
    /// Home page library, this page.
    Library(u32),
    /// Home page new releases.
    NewReleases,
    /// Track page: the track followed by its related tracks.
    Related(String),
    /// Collection page.
    Collection(String),
}

impl PlaylistSource {
    /// Parse `kind:argument`. Unknown kinds yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (kind, arg) = raw.split_once(':').unwrap_or((raw, ""));
        match kind {
            "catalog" => Some(Self::Catalog(arg.to_string())),
            "library" => Some(Self::Library(arg.parse().unwrap_or(1))),
            "new" => Some(Self::NewReleases),
            "related" if !arg.is_empty() => Some(Self::Related(arg.to_string())),
            "collection" if !arg.is_empty() => Some(Self::Collection(arg.to_string())),
            _ => None,
        }
    }

    async fn tracks(&self, state: &AppState) -> std::result::Result<Vec<Track>, ApiError> {
        let api = state.api();
        match self {
            Self::Catalog(query) => Ok(api
                .list_tracks(&CatalogFilter::from_query(query))
                .await?
                .into_items()),
            Self::Library(page) => Ok(api.library_page(*page).await?.into_items()),
            Self::NewReleases => api.new_releases().await,
            Self::Related(slug) => {
                let track = api.get_track(slug).await?;
                let mut tracks = api.related_tracks(&track).await?;
                tracks.insert(0, track);
                Ok(tracks)
            }
            Self::Collection(slug) => Ok(api.get_collection(slug).await?.tracks),
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Player state as returned to the player script.
#[derive(Debug, Serialize)]
pub struct PlayerStateView {
    pub current: Option<PlayerTrack>,
    pub is_playing: bool,
    pub volume: f32,
    pub has_next: bool,
    pub has_prev: bool,
    pub playlist_len: usize,
}

impl From<&Player> for PlayerStateView {
    fn from(player: &Player) -> Self {
        Self {
            current: player.current().cloned(),
            is_playing: player.is_playing(),
            volume: player.volume(),
            has_next: player.has_next(),
            has_prev: player.has_prev(),
            playlist_len: player.playlist().len(),
        }
    }
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.starts_with("application/json"))
}

fn reply(headers: &HeaderMap, player: &Player, return_to: Option<&str>) -> Response {
    if wants_json(headers) {
        Json(PlayerStateView::from(player)).into_response()
    } else {
        local_redirect(return_to, "/").into_response()
    }
}

/// Apply `action` to the stored player and reply.
async fn act(
    store: &PlayerStore,
    headers: &HeaderMap,
    return_to: Option<&str>,
    action: impl FnOnce(&mut Player) + Send,
) -> Result<Response> {
    let (player, ()) = store.update(action).await?;
    Ok(reply(headers, &player, return_to))
}

// =============================================================================
// Handlers
// =============================================================================

/// Play a track, with the listing it was clicked in as the playlist.
/// Playing the current track again toggles pause.
///
/// # Errors
///
/// Returns the not-found page for an unknown track.
#[instrument(skip(state, store, headers))]
pub async fn play(
    State(state): State<AppState>,
    store: PlayerStore,
    headers: HeaderMap,
    Form(form): Form<PlayForm>,
) -> Result<Response> {
    let source = form.source.as_deref().and_then(PlaylistSource::parse);

    let playlist = match &source {
        Some(source) => source.tracks(&state).await.unwrap_or_else(|e| {
            tracing::warn!(?source, "Failed to load playlist, playing single track: {e}");
            Vec::new()
        }),
        None => Vec::new(),
    };

    let track = match playlist.iter().find(|t| t.slug == form.slug) {
        Some(track) => track.clone(),
        None => state.api().get_track(&form.slug).await?,
    };
    if track.audio_file_preview.is_none() {
        return Err(AppError::BadRequest(format!(
            "track {} has no preview",
            track.slug
        )));
    }

    // Tracks without a preview cannot be queued.
    let playlist: Vec<PlayerTrack> = playlist
        .iter()
        .filter(|t| t.audio_file_preview.is_some())
        .map(PlayerTrack::from)
        .collect();
    let track = PlayerTrack::from(&track);

    act(&store, &headers, form.return_to.as_deref(), |player| {
        player.set_track(track, playlist);
    })
    .await
}

/// Flip play/pause.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
#[instrument(skip_all)]
pub async fn toggle(
    store: PlayerStore,
    headers: HeaderMap,
    Form(form): Form<ReturnForm>,
) -> Result<Response> {
    act(&store, &headers, form.return_to.as_deref(), Player::toggle).await
}

/// Pause. Also reported by the player script when autoplay is blocked.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
#[instrument(skip_all)]
pub async fn pause(
    store: PlayerStore,
    headers: HeaderMap,
    Form(form): Form<ReturnForm>,
) -> Result<Response> {
    act(&store, &headers, form.return_to.as_deref(), Player::pause).await
}

/// Resume playback of the current track.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
#[instrument(skip_all)]
pub async fn resume(
    store: PlayerStore,
    headers: HeaderMap,
    Form(form): Form<ReturnForm>,
) -> Result<Response> {
    act(&store, &headers, form.return_to.as_deref(), Player::play).await
}

/// Next playlist entry; stops at the end. Also posted when a preview ends.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
#[instrument(skip_all)]
pub async fn next(
    store: PlayerStore,
    headers: HeaderMap,
    Form(form): Form<ReturnForm>,
) -> Result<Response> {
    act(&store, &headers, form.return_to.as_deref(), Player::next).await
}

/// Previous playlist entry; no-op on the first.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
#[instrument(skip_all)]
pub async fn prev(
    store: PlayerStore,
    headers: HeaderMap,
    Form(form): Form<ReturnForm>,
) -> Result<Response> {
    act(&store, &headers, form.return_to.as_deref(), Player::prev).await
}

/// Set the volume. Values above 1 are read as percentages.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
#[instrument(skip_all)]
pub async fn volume(
    store: PlayerStore,
    headers: HeaderMap,
    Form(form): Form<VolumeForm>,
) -> Result<Response> {
    let volume = if form.volume > 1.0 {
        form.volume / 100.0
    } else {
        form.volume
    };
    act(&store, &headers, form.return_to.as_deref(), |player| {
        player.set_volume(volume);
    })
    .await
}

/// Current player state as JSON.
#[instrument(skip_all)]
pub async fn state(store: PlayerStore) -> Json<PlayerStateView> {
    Json(PlayerStateView::from(&store.load().await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_source_parsing() {
        assert_eq!(
            PlaylistSource::parse("catalog:tags__slug=calm%2Cpiano"),
            Some(PlaylistSource::Catalog("tags__slug=calm%2Cpiano".into()))
        );
        assert_eq!(
            PlaylistSource::parse("catalog:"),
            Some(PlaylistSource::Catalog(String::new()))
        );
        assert_eq!(PlaylistSource::parse("library:3"), Some(PlaylistSource::Library(3)));
        assert_eq!(PlaylistSource::parse("library:x"), Some(PlaylistSource::Library(1)));
        assert_eq!(PlaylistSource::parse("new"), Some(PlaylistSource::NewReleases));
        assert_eq!(
            PlaylistSource::parse("collection:lofi-pack"),
            Some(PlaylistSource::Collection("lofi-pack".into()))
        );
        assert_eq!(PlaylistSource::parse("collection:"), None);
        assert_eq!(PlaylistSource::parse("radio:1"), None);
    }

    #[test]
    fn test_json_detection() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));
        headers.insert(
            ACCEPT,
            axum::http::HeaderValue::from_static("application/json, text/plain"),
        );
        assert!(wants_json(&headers));
    }
}
