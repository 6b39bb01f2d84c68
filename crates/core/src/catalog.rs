//! Catalog records mirrored from the music API.
//!
//! These types deserialize the JSON the API returns for tracks,
//! collections, categories and tags. Optional fields are defaulted so that a
//! sparse listing payload and a full detail payload share one type.

use serde::{Deserialize, Serialize};

use crate::player::parse_duration;
use crate::types::{CategoryId, CollectionId, Price, TagId, TrackId};

/// A track category (genre-like grouping, e.g. "Cinematic").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// Which sidebar group a tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Mood,
    Instrument,
    Usage,
    #[serde(other)]
    Other,
}

impl TagType {
    /// Heading shown above the tag group.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mood => "Mood",
            Self::Instrument => "Instruments",
            Self::Usage => "Usage",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub slug: String,
    pub tag_type: TagType,
}

/// A single licensable track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub slug: String,
    pub price: Price,
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Watermarked preview, the only audio the storefront ever plays.
    #[serde(default)]
    pub audio_file_preview: Option<String>,
    /// Django duration string, e.g. `"00:02:05"`.
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub description_short: Option<String>,
    #[serde(default)]
    pub description_full: Option<String>,
    #[serde(default)]
    pub is_new: bool,
}

impl Track {
    /// Duration in seconds, when the API provided a parseable one.
    #[must_use]
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration.as_deref().and_then(parse_duration)
    }

    /// Tags of one group, in API order.
    pub fn tags_of(&self, tag_type: TagType) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(move |tag| tag.tag_type == tag_type)
    }

    /// Make relative cover and preview paths absolute against `origin`.
    pub fn resolve_media(&mut self, origin: &str) {
        resolve(&mut self.cover_image, origin);
        resolve(&mut self.audio_file_preview, origin);
    }
}

/// A bundle of tracks sold together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub title: String,
    pub slug: String,
    pub price: Price,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub is_new: bool,
}

impl Collection {
    /// Make relative media paths absolute, including those of the tracks.
    pub fn resolve_media(&mut self, origin: &str) {
        resolve(&mut self.cover_image, origin);
        for track in &mut self.tracks {
            track.resolve_media(origin);
        }
    }
}

/// Absolute URL for a media path the API returned.
///
/// Django returns absolute URLs when it knows the request host and bare
/// `/media/...` paths otherwise; both must reach the browser absolute.
#[must_use]
pub fn media_url(origin: &str, raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") || raw.starts_with("//") {
        raw.to_owned()
    } else {
        format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            raw.trim_start_matches('/')
        )
    }
}

pub(crate) fn resolve(field: &mut Option<String>, origin: &str) {
    match field.as_deref().map(str::trim) {
        Some("") => *field = None,
        Some(raw) => *field = Some(media_url(origin, raw)),
        None => {}
    }
}

/// A list endpoint response.
///
/// Paginated endpoints wrap results in a `{count, next, previous, results}`
/// envelope; unpaginated ones return a bare array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paginated {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    #[must_use]
    pub fn items(&self) -> &[T] {
        match self {
            Self::Paginated { results, .. } => results,
            Self::Plain(items) => items,
        }
    }

    pub fn items_mut(&mut self) -> &mut [T] {
        match self {
            Self::Paginated { results, .. } => results,
            Self::Plain(items) => items,
        }
    }

    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Paginated { results, .. } => results,
            Self::Plain(items) => items,
        }
    }

    /// Whether the API advertised a following page.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        matches!(self, Self::Paginated { next: Some(_), .. })
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        matches!(self, Self::Paginated { previous: Some(_), .. })
    }

    /// Total result count across all pages, falling back to this page's size.
    #[must_use]
    pub fn total(&self) -> u64 {
        match self {
            Self::Paginated {
                count: Some(count), ..
            } => *count,
            _ => self.items().len() as u64,
        }
    }
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self::Plain(Vec::new())
    }
}

/// Tags split into the three sidebar groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagGroups {
    pub mood: Vec<Tag>,
    pub instrument: Vec<Tag>,
    pub usage: Vec<Tag>,
}

impl TagGroups {
    /// Group tags by type, preserving order. Unknown tag types are dropped.
    #[must_use]
    pub fn from_tags(tags: &[Tag]) -> Self {
        let mut groups = Self::default();
        for tag in tags {
            match tag.tag_type {
                TagType::Mood => groups.mood.push(tag.clone()),
                TagType::Instrument => groups.instrument.push(tag.clone()),
                TagType::Usage => groups.usage.push(tag.clone()),
                TagType::Other => {}
            }
        }
        groups
    }

    /// Non-empty groups in sidebar order.
    #[must_use]
    pub fn sections(&self) -> Vec<(TagType, &[Tag])> {
        [
            (TagType::Mood, self.mood.as_slice()),
            (TagType::Instrument, self.instrument.as_slice()),
            (TagType::Usage, self.usage.as_slice()),
        ]
        .into_iter()
        .filter(|(_, tags)| !tags.is_empty())
        .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn track_json() -> serde_json::Value {
        json!({
            "id": 3,
            "title": "Morning Drive",
            "slug": "morning-drive",
            "price": "1500.00",
            "cover_image": "http://127.0.0.1:8000/media/covers/md.jpg",
            "audio_file_preview": "http://127.0.0.1:8000/media/previews/md.mp3",
            "duration": "00:02:05",
            "category": {"id": 1, "name": "Pop", "slug": "pop"},
            "tags": [
                {"id": 1, "name": "Happy", "slug": "happy", "tag_type": "mood"},
                {"id": 2, "name": "Piano", "slug": "piano", "tag_type": "instrument"}
            ],
            "is_new": true
        })
    }

    #[test]
    fn test_track_deserializes_full_payload() {
        let track: Track = serde_json::from_value(track_json()).unwrap();
        assert_eq!(track.id, TrackId::new(3));
        assert_eq!(track.category.as_ref().unwrap().slug, "pop");
        assert_eq!(track.duration_seconds(), Some(125.0));
        assert_eq!(track.tags_of(TagType::Instrument).count(), 1);
        assert!(track.is_new);
    }

    #[test]
    fn test_track_deserializes_sparse_payload() {
        let track: Track = serde_json::from_value(json!({
            "id": 1, "title": "Solo", "slug": "solo", "price": 990
        }))
        .unwrap();
        assert!(track.tags.is_empty());
        assert!(track.audio_file_preview.is_none());
        assert!(!track.is_new);
    }

    #[test]
    fn test_unknown_tag_type() {
        let tag: Tag = serde_json::from_value(json!({
            "id": 9, "name": "Vintage", "slug": "vintage", "tag_type": "era"
        }))
        .unwrap();
        assert_eq!(tag.tag_type, TagType::Other);
    }

    #[test]
    fn test_listing_accepts_envelope_and_array() {
        let paged: Listing<Track> = serde_json::from_value(json!({
            "count": 7,
            "next": "http://api/tracks/?page=2",
            "previous": null,
            "results": [track_json()]
        }))
        .unwrap();
        assert!(paged.has_next());
        assert_eq!(paged.total(), 7);
        assert_eq!(paged.items().len(), 1);

        let plain: Listing<Track> = serde_json::from_value(json!([track_json()])).unwrap();
        assert!(!plain.has_next());
        assert_eq!(plain.total(), 1);
    }

    #[test]
    fn test_tag_groups() {
        let track: Track = serde_json::from_value(track_json()).unwrap();
        let groups = TagGroups::from_tags(&track.tags);
        assert_eq!(groups.mood.len(), 1);
        assert_eq!(groups.instrument.len(), 1);
        assert!(groups.usage.is_empty());
        assert_eq!(groups.sections().len(), 2);
    }

    #[test]
    fn test_media_urls_resolve_against_origin() {
        assert_eq!(
            media_url("http://127.0.0.1:8000", "/media/covers/a.jpg"),
            "http://127.0.0.1:8000/media/covers/a.jpg"
        );
        assert_eq!(
            media_url("http://127.0.0.1:8000/", "https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );

        let mut track: Track = serde_json::from_value(track_json()).unwrap();
        track.cover_image = Some("media/covers/md.jpg".into());
        track.audio_file_preview = Some("  ".into());
        track.resolve_media("https://media.proffmusic.ru");
        assert_eq!(
            track.cover_image.as_deref(),
            Some("https://media.proffmusic.ru/media/covers/md.jpg")
        );
        assert!(track.audio_file_preview.is_none());
    }
}
