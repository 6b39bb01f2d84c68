//! Player persistence.
//!
//! The playing flag is persisted too, so moving between pages keeps the
//! preview running.

use proffmusic_core::Player;

use super::{Persisted, SessionStore};
use crate::models::session_keys;

impl Persisted for Player {
    const KEY: &'static str = session_keys::PLAYER;
}

/// The visitor's player.
pub type PlayerStore = SessionStore<Player>;
