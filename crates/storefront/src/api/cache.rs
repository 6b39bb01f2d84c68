//! Cache types for catalog API responses.

use proffmusic_core::{Category, Collection, Listing, Tag, Track};

/// Cache key for catalog reads.
///
/// Track listings are keyed by their full encoded query, so every filter
/// combination and page is cached separately.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Tags,
    Tracks(String),
    Track(String),
    Collections,
    Collection(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
    Tags(Vec<Tag>),
    Tracks(Listing<Track>),
    Track(Box<Track>),
    Collections(Vec<Collection>),
    Collection(Box<Collection>),
}
