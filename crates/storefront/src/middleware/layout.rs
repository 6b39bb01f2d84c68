//! Per-request data every page layout needs.
//!
//! The header shows the cart badge and the signed-in user; the footer holds
//! the player bar. Pages take a [`Layout`] extractor and hand it to their
//! template, which extends `base.html`.

use std::collections::HashSet;

use axum::{extract::FromRequestParts, http::request::Parts};
use proffmusic_core::player::format_duration;
use proffmusic_core::{Cart, Player, PlayerTrack, TrackId};
use tower_sessions::Session;

use super::CspNonce;
use crate::stores::{AuthStore, CartStore, PlayerStore};

/// Signed-in user as shown in the header.
#[derive(Clone, Debug)]
pub struct UserBadge {
    pub name: String,
    pub initial: String,
    pub avatar: Option<String>,
}

/// Player bar contents.
#[derive(Clone, Debug, Default)]
pub struct PlayerBar {
    pub track: Option<PlayerTrack>,
    pub is_playing: bool,
    /// Volume as `0.00`..`1.00` for the audio element.
    pub volume: String,
    /// Volume as a whole percentage for the range input.
    pub volume_percent: u8,
    pub duration: String,
    pub has_next: bool,
    pub has_prev: bool,
}

impl From<&Player> for PlayerBar {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(player: &Player) -> Self {
        let track = player.current().cloned();
        let duration = track
            .as_ref()
            .and_then(|t| t.duration.as_deref())
            .map(format_duration)
            .unwrap_or_default();
        Self {
            track,
            is_playing: player.is_playing(),
            volume: format!("{:.2}", player.volume()),
            volume_percent: (player.volume() * 100.0).round() as u8,
            duration,
            has_next: player.has_next(),
            has_prev: player.has_prev(),
        }
    }
}

/// Layout data extracted from the session.
#[derive(Clone, Debug)]
pub struct Layout {
    pub nonce: String,
    /// Path and query of this page, used as `return_to` by forms.
    pub path: String,
    pub cart_count: usize,
    pub user: Option<UserBadge>,
    pub player: PlayerBar,
    cart_keys: HashSet<String>,
    playing: Option<TrackId>,
}

impl Layout {
    fn new(nonce: String, path: String, cart: &Cart, player: &Player) -> Self {
        Self {
            nonce,
            path,
            cart_count: cart.len(),
            user: None,
            player: PlayerBar::from(player),
            cart_keys: cart.items().iter().map(|item| item.key()).collect(),
            playing: player
                .current()
                .filter(|_| player.is_playing())
                .map(|t| t.id),
        }
    }

    /// Whether an item with this composite key is in the cart.
    #[must_use]
    pub fn in_cart(&self, key: &str) -> bool {
        self.cart_keys.contains(key)
    }

    /// Whether this track is the one currently playing.
    #[must_use]
    pub fn is_playing(&self, id: TrackId) -> bool {
        self.playing == Some(id)
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Refresh the cart badge after a handler changed the cart.
    pub fn set_cart(&mut self, cart: &Cart) {
        self.cart_count = cart.len();
        self.cart_keys = cart.items().iter().map(|item| item.key()).collect();
    }
}

impl<S> FromRequestParts<S> for Layout
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let path = parts
            .uri
            .path_and_query()
            .map_or_else(|| "/".to_string(), ToString::to_string);

        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            tracing::warn!("Session not found in request extensions - layer may be missing");
            return Ok(Self::new(nonce, path, &Cart::new(), &Player::new()));
        };

        let cart = CartStore::new(session.clone()).load().await;
        let player = PlayerStore::new(session.clone()).load().await;
        let mut layout = Self::new(nonce, path, &cart, &player);

        layout.user = AuthStore::new(session).current().await.map(|auth| UserBadge {
            name: auth.user.display_name(),
            initial: auth.user.initial(),
            avatar: auth.user.avatar,
        });

        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proffmusic_core::{CartItem, ItemKind, ItemRef, Price};

    fn track(id: u32) -> PlayerTrack {
        PlayerTrack {
            id: TrackId::new(id),
            title: format!("Track {id}"),
            slug: format!("track-{id}"),
            preview_url: Some(format!("/media/{id}.mp3")),
            cover_image: None,
            duration: Some("00:02:05".into()),
        }
    }

    #[test]
    fn test_layout_marks_playing_track_and_cart_items() {
        let mut player = Player::new();
        player.set_track(track(1), vec![track(1), track(2)]);
        let mut cart = Cart::new();
        cart.add(CartItem {
            item: ItemRef::new(ItemKind::Track, 2),
            title: "Track 2".into(),
            price: Price::from_rubles(900),
            image: None,
            slug: "track-2".into(),
        });

        let layout = Layout::new(String::new(), "/music".into(), &cart, &player);
        assert!(layout.is_playing(TrackId::new(1)));
        assert!(!layout.is_playing(TrackId::new(2)));
        assert!(layout.in_cart("track-2"));
        assert_eq!(layout.cart_count, 1);
        assert_eq!(layout.player.duration, "2:05");
        assert_eq!(layout.player.volume_percent, 70);
        assert!(layout.player.has_next);
        assert!(!layout.player.has_prev);
    }
}
