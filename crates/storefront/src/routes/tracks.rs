//! Track detail page and the track card shared by every listing.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use proffmusic_core::player::format_duration;
use proffmusic_core::{ItemKind, ItemRef, TagType, Track, TrackId};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::Layout;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Track display data for cards and lists.
#[derive(Clone, Debug)]
pub struct TrackCard {
    pub id: TrackId,
    pub title: String,
    pub slug: String,
    pub price: String,
    pub cover: Option<String>,
    pub duration: String,
    pub category: Option<String>,
    pub is_new: bool,
    pub has_preview: bool,
    /// Composite cart key, `track-{id}`.
    pub cart_key: String,
}

impl TrackCard {
    #[must_use]
    pub fn href(&self) -> String {
        format!("/tracks/{}", self.slug)
    }
}

impl From<&Track> for TrackCard {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id,
            title: track.title.clone(),
            slug: track.slug.clone(),
            price: track.price.display(),
            cover: track.cover_image.clone(),
            duration: track
                .duration
                .as_deref()
                .map(format_duration)
                .unwrap_or_default(),
            category: track.category.as_ref().map(|c| c.name.clone()),
            is_new: track.is_new,
            has_preview: track.audio_file_preview.is_some(),
            cart_key: ItemRef::new(ItemKind::Track, track.id.as_u32()).key(),
        }
    }
}

/// A titled group of tag names on the detail page.
#[derive(Clone, Debug)]
pub struct TagLine {
    pub label: &'static str,
    pub names: String,
}

/// Full track view for the detail page.
#[derive(Clone, Debug)]
pub struct TrackDetail {
    pub card: TrackCard,
    pub description_short: Option<String>,
    pub description_full: Option<String>,
    pub tag_lines: Vec<TagLine>,
}

impl From<&Track> for TrackDetail {
    fn from(track: &Track) -> Self {
        let tag_lines = [TagType::Mood, TagType::Instrument, TagType::Usage]
            .into_iter()
            .filter_map(|tag_type| {
                let names: Vec<&str> = track.tags_of(tag_type).map(|t| t.name.as_str()).collect();
                (!names.is_empty()).then(|| TagLine {
                    label: tag_type.label(),
                    names: names.join(", "),
                })
            })
            .collect();

        Self {
            card: TrackCard::from(track),
            description_short: track.description_short.clone().filter(|s| !s.is_empty()),
            description_full: track.description_full.clone().filter(|s| !s.is_empty()),
            tag_lines,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Track detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "tracks/show.html")]
pub struct TrackShowTemplate {
    pub layout: Layout,
    pub track: TrackDetail,
    pub related: Vec<TrackCard>,
    /// Playlist source for the play buttons on this page.
    pub source: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display a track with up to three related tracks from its category.
///
/// # Errors
///
/// Returns the not-found page if no track has this slug.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    layout: Layout,
) -> Result<TrackShowTemplate> {
    let track = state.api().get_track(&slug).await?;

    let related = state
        .api()
        .related_tracks(&track)
        .await
        .map_or_else(
            |e| {
                tracing::warn!("Failed to fetch related tracks for {slug}: {e}");
                Vec::new()
            },
            |tracks| tracks.iter().map(TrackCard::from).collect(),
        );

    Ok(TrackShowTemplate {
        layout,
        source: format!("related:{slug}"),
        track: TrackDetail::from(&track),
        related,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_track_views() {
        let track: Track = serde_json::from_value(json!({
            "id": 12,
            "title": "Night Run",
            "slug": "night-run",
            "price": "1500.00",
            "duration": "00:03:07",
            "tags": [
                {"id": 1, "name": "Dark", "slug": "dark", "tag_type": "mood"},
                {"id": 2, "name": "Tense", "slug": "tense", "tag_type": "mood"},
                {"id": 3, "name": "Synth", "slug": "synth", "tag_type": "instrument"}
            ],
            "description_short": ""
        }))
        .unwrap();

        let detail = TrackDetail::from(&track);
        assert_eq!(detail.card.price, "1500 ₽");
        assert_eq!(detail.card.duration, "3:07");
        assert_eq!(detail.card.cart_key, "track-12");
        assert_eq!(detail.card.href(), "/tracks/night-run");
        assert!(!detail.card.has_preview);
        assert!(detail.description_short.is_none());
        assert_eq!(detail.tag_lines.len(), 2);
        assert_eq!(detail.tag_lines[0].names, "Dark, Tense");
    }
}
