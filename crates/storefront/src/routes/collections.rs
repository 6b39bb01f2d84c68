//! Collection route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use proffmusic_core::{Collection, CollectionId, ItemKind, ItemRef};
use tracing::instrument;

use super::tracks::TrackCard;
use crate::error::Result;
use crate::filters;
use crate::middleware::Layout;
use crate::state::AppState;

/// Collection display data for templates.
#[derive(Clone, Debug)]
pub struct CollectionCard {
    pub id: CollectionId,
    pub title: String,
    pub slug: String,
    pub price: String,
    pub cover: Option<String>,
    pub description: Option<String>,
    pub track_count: usize,
    pub is_new: bool,
    pub cart_key: String,
}

impl CollectionCard {
    #[must_use]
    pub fn href(&self) -> String {
        format!("/collections/{}", self.slug)
    }
}

impl From<&Collection> for CollectionCard {
    fn from(collection: &Collection) -> Self {
        Self {
            id: collection.id,
            title: collection.title.clone(),
            slug: collection.slug.clone(),
            price: collection.price.display(),
            cover: collection.cover_image.clone(),
            description: collection.description.clone().filter(|d| !d.is_empty()),
            track_count: collection.tracks.len(),
            is_new: collection.is_new,
            cart_key: ItemRef::new(ItemKind::Collection, collection.id.as_u32()).key(),
        }
    }
}

/// Collection listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub layout: Layout,
    pub collections: Vec<CollectionCard>,
}

/// Collection detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/show.html")]
pub struct CollectionShowTemplate {
    pub layout: Layout,
    pub collection: CollectionCard,
    pub tracks: Vec<TrackCard>,
    pub source: String,
}

/// Display all collections.
#[instrument(skip(state, layout))]
pub async fn index(State(state): State<AppState>, layout: Layout) -> CollectionsIndexTemplate {
    let collections = state.api().list_collections().await.map_or_else(
        |e| {
            tracing::warn!("Failed to fetch collections: {e}");
            Vec::new()
        },
        |collections| collections.iter().map(CollectionCard::from).collect(),
    );

    CollectionsIndexTemplate {
        layout,
        collections,
    }
}

/// Display a collection and its tracks.
///
/// # Errors
///
/// Returns the not-found page if no collection has this slug.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    layout: Layout,
) -> Result<CollectionShowTemplate> {
    let collection = state.api().get_collection(&slug).await?;

    Ok(CollectionShowTemplate {
        layout,
        source: format!("collection:{slug}"),
        tracks: collection.tracks.iter().map(TrackCard::from).collect(),
        collection: CollectionCard::from(&collection),
    })
}
