//! Shopping cart.
//!
//! The cart is a small ordered list of tracks and collections the visitor
//! intends to buy. Each `(type, id)` pair appears at most once; the API
//! computes the authoritative total at checkout, the local total is only a
//! preview.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{Collection, Track};
use crate::types::{CollectionId, Price, TrackId};

/// The two kinds of sellable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Track,
    Collection,
}

impl ItemKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Collection => "collection",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a sellable item, serialized the way checkout expects it:
/// `{"type": "track", "id": 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum ItemRef {
    Track(TrackId),
    Collection(CollectionId),
}

impl ItemRef {
    /// Build a reference from a kind and a raw ID.
    #[must_use]
    pub fn new(kind: ItemKind, id: u32) -> Self {
        match kind {
            ItemKind::Track => Self::Track(TrackId::new(id)),
            ItemKind::Collection => Self::Collection(CollectionId::new(id)),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Track(_) => ItemKind::Track,
            Self::Collection(_) => ItemKind::Collection,
        }
    }

    #[must_use]
    pub const fn raw_id(&self) -> u32 {
        match self {
            Self::Track(id) => id.as_u32(),
            Self::Collection(id) => id.as_u32(),
        }
    }

    /// Composite key, e.g. `"track-12"`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}-{}", self.kind(), self.raw_id())
    }
}

/// A line in the cart, snapshotting what the visitor saw when adding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub item: ItemRef,
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    pub slug: String,
}

impl CartItem {
    #[must_use]
    pub fn key(&self) -> String {
        self.item.key()
    }

    /// Storefront page for the item.
    #[must_use]
    pub fn href(&self) -> String {
        match self.item.kind() {
            ItemKind::Track => format!("/tracks/{}", self.slug),
            ItemKind::Collection => format!("/collections/{}", self.slug),
        }
    }
}

impl From<&Track> for CartItem {
    fn from(track: &Track) -> Self {
        Self {
            item: ItemRef::Track(track.id),
            title: track.title.clone(),
            price: track.price,
            image: track.cover_image.clone(),
            slug: track.slug.clone(),
        }
    }
}

impl From<&Collection> for CartItem {
    fn from(collection: &Collection) -> Self {
        Self {
            item: ItemRef::Collection(collection.id),
            title: collection.title.clone(),
            price: collection.price,
            image: collection.cover_image.clone(),
            slug: collection.slug.clone(),
        }
    }
}

/// An ordered, duplicate-free list of cart items.
///
/// Persisted form is a plain JSON array; duplicates in a persisted value are
/// dropped on load, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add an item unless one with the same `(type, id)` is already present.
    ///
    /// Returns `true` when the cart changed.
    pub fn add(&mut self, item: CartItem) -> bool {
        if self.contains(item.item) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove the item with this `(type, id)`. Returns `true` when one was removed.
    pub fn remove(&mut self, item: ItemRef) -> bool {
        let before = self.items.len();
        self.items.retain(|existing| existing.item != item);
        self.items.len() != before
    }

    #[must_use]
    pub fn contains(&self, item: ItemRef) -> bool {
        self.items.iter().any(|existing| existing.item == item)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// The `(type, id)` list submitted at checkout, in cart order.
    #[must_use]
    pub fn item_refs(&self) -> Vec<ItemRef> {
        self.items.iter().map(|item| item.item).collect()
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            cart.add(item);
        }
        cart
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
