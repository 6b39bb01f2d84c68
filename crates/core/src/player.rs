//! Audio preview player state.
//!
//! The browser's `<audio>` element does the actual playback. This module
//! only tracks what should be playing: the current track, the playlist it
//! came from, whether playback is running and the volume.
//!
//! Invariant: when `current` is set it is an entry of `playlist`.

use serde::{Deserialize, Serialize};

use crate::catalog::Track;
use crate::types::TrackId;

/// Default volume for new visitors.
pub const DEFAULT_VOLUME: f32 = 0.7;

/// The subset of a [`Track`] the player needs to render and play it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTrack {
    pub id: TrackId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

impl From<&Track> for PlayerTrack {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id,
            title: track.title.clone(),
            slug: track.slug.clone(),
            preview_url: track.audio_file_preview.clone(),
            cover_image: track.cover_image.clone(),
            duration: track.duration.clone(),
        }
    }
}

/// Persisted player state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PlayerState", into = "PlayerState")]
pub struct Player {
    current: Option<PlayerTrack>,
    playlist: Vec<PlayerTrack>,
    is_playing: bool,
    volume: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            current: None,
            playlist: Vec::new(),
            is_playing: false,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl Player {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current(&self) -> Option<&PlayerTrack> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn playlist(&self) -> &[PlayerTrack] {
        &self.playlist
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.is_playing
    }

    #[must_use]
    pub const fn volume(&self) -> f32 {
        self.volume
    }

    /// Select a track to play.
    ///
    /// Selecting the current track again toggles playback and keeps the
    /// playlist. Otherwise the track becomes current, `playlist` replaces the
    /// queue and playback starts. An empty playlist, or one that does not
    /// contain the track, is replaced by a single-entry queue.
    pub fn set_track(&mut self, track: PlayerTrack, playlist: Vec<PlayerTrack>) {
        if self.current.as_ref().is_some_and(|current| current.id == track.id) {
            self.is_playing = !self.is_playing;
            return;
        }

        self.playlist = if playlist.iter().any(|entry| entry.id == track.id) {
            playlist
        } else {
            vec![track.clone()]
        };
        self.current = Some(track);
        self.is_playing = true;
    }

    /// Flip play/pause. Does nothing without a current track.
    pub fn toggle(&mut self) {
        if self.current.is_some() {
            self.is_playing = !self.is_playing;
        }
    }

    pub fn play(&mut self) {
        if self.current.is_some() {
            self.is_playing = true;
        }
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    /// Position of the current track in the playlist.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        self.playlist.iter().position(|entry| entry.id == current.id)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current_index()
            .is_some_and(|index| index + 1 < self.playlist.len())
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.current_index().is_some_and(|index| index > 0)
    }

    /// Advance to the next playlist entry. At the end of the playlist
    /// playback stops and the current track stays selected.
    pub fn next(&mut self) {
        let Some(index) = self.current_index() else {
            return;
        };
        match self.playlist.get(index + 1) {
            Some(next) => {
                self.current = Some(next.clone());
                self.is_playing = true;
            }
            None => self.is_playing = false,
        }
    }

    /// Step back to the previous entry. No-op on the first entry.
    pub fn prev(&mut self) {
        let Some(index) = self.current_index() else {
            return;
        };
        let Some(prev) = index.checked_sub(1).and_then(|i| self.playlist.get(i)) else {
            return;
        };
        self.current = Some(prev.clone());
        self.is_playing = true;
    }

    /// Set the volume, clamped into `0.0..=1.0`. NaN is ignored.
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Drop the current track and the playlist. Volume is kept.
    pub fn clear(&mut self) {
        self.current = None;
        self.playlist.clear();
        self.is_playing = false;
    }
}

/// Wire form of [`Player`]. Loading re-establishes the invariants.
#[derive(Serialize, Deserialize)]
struct PlayerState {
    #[serde(default)]
    current: Option<PlayerTrack>,
    #[serde(default)]
    playlist: Vec<PlayerTrack>,
    #[serde(default)]
    is_playing: bool,
    #[serde(default = "default_volume")]
    volume: f32,
}

const fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

impl From<PlayerState> for Player {
    fn from(state: PlayerState) -> Self {
        let mut player = Self::default();
        player.set_volume(state.volume);
        if let Some(current) = state.current {
            player.playlist = if state.playlist.iter().any(|entry| entry.id == current.id) {
                state.playlist
            } else {
                vec![current.clone()]
            };
            player.current = Some(current);
            player.is_playing = state.is_playing;
        }
        player
    }
}

impl From<Player> for PlayerState {
    fn from(player: Player) -> Self {
        Self {
            current: player.current,
            playlist: player.playlist,
            is_playing: player.is_playing,
            volume: player.volume,
        }
    }
}

/// Parse a Django duration string (`"HH:MM:SS"`, `"MM:SS"`, optionally with
/// fractional seconds or a leading `"D "` day count) into seconds.
#[must_use]
pub fn parse_duration(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let (days, clock) = match raw.split_once(' ') {
        Some((days, clock)) => (days.parse::<f64>().ok()?, clock),
        None => (0.0, raw),
    };

    let mut seconds = 0.0;
    let mut parts = 0;
    for part in clock.split(':') {
        let value = part.parse::<f64>().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        seconds = seconds * 60.0 + value;
        parts += 1;
    }
    if parts > 3 {
        return None;
    }
    Some(days.mul_add(86_400.0, seconds))
}

/// Format seconds as `m:ss`. Invalid or non-positive input renders `0:00`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_owned();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Display form of an API duration string, e.g. `"00:02:05"` → `"2:05"`.
#[must_use]
pub fn format_duration(raw: &str) -> String {
    parse_duration(raw).map_or_else(|| "0:00".to_owned(), format_time)
}
