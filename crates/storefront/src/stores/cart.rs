//! Cart persistence.

use proffmusic_core::Cart;

use super::{Persisted, SessionStore};
use crate::models::session_keys;

impl Persisted for Cart {
    const KEY: &'static str = session_keys::CART;
}

/// The visitor's cart.
pub type CartStore = SessionStore<Cart>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stores::test_support::session;
    use proffmusic_core::{CartItem, ItemKind, ItemRef, Price};

    fn item(id: u32) -> CartItem {
        CartItem {
            item: ItemRef::new(ItemKind::Track, id),
            title: format!("Track {id}"),
            price: Price::from_rubles(500),
            image: None,
            slug: format!("track-{id}"),
        }
    }

    #[tokio::test]
    async fn test_empty_session_loads_empty_cart() {
        let store = CartStore::new(session());
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_persists() {
        let session = session();
        let store = CartStore::new(session.clone());

        let (_, added) = store.update(|cart| cart.add(item(1))).await.unwrap();
        assert!(added);
        let (_, added_again) = store.update(|cart| cart.add(item(1))).await.unwrap();
        assert!(!added_again);

        let reloaded = CartStore::new(session).load().await;
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.total(), Price::from_rubles(500));
    }

    #[tokio::test]
    async fn test_corrupt_value_resets() {
        let session = session();
        session
            .insert(session_keys::CART, "not a cart")
            .await
            .unwrap();
        assert!(CartStore::new(session).load().await.is_empty());
    }
}
