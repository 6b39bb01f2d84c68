//! Catalog reads: tracks, collections, categories and tags.

use proffmusic_core::filter::{DEFAULT_ORDERING, encode};
use proffmusic_core::{CatalogFilter, Category, Collection, Listing, Tag, Track};
use tracing::instrument;

use super::cache::{CacheKey, CacheValue};
use super::client::segment;
use super::{ApiClient, ApiError};

/// How many related tracks the track page shows.
const RELATED_LIMIT: usize = 3;

impl ApiClient {
    /// Tracks matching a catalog filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, filter), fields(query = %filter.to_query_string()))]
    pub async fn list_tracks(&self, filter: &CatalogFilter) -> Result<Listing<Track>, ApiError> {
        self.tracks(filter.api_pairs()).await
    }

    /// Tracks flagged as new releases.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn new_releases(&self) -> Result<Vec<Track>, ApiError> {
        let listing = self.tracks(vec![pair("is_new", "true")]).await?;
        Ok(listing.into_items())
    }

    /// One page of the full library, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn library_page(&self, page: u32) -> Result<Listing<Track>, ApiError> {
        self.tracks(vec![
            pair("page", &page.max(1).to_string()),
            pair("ordering", DEFAULT_ORDERING),
        ])
        .await
    }

    /// A single track by slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no track has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_track(&self, slug: &str) -> Result<Track, ApiError> {
        let key = CacheKey::Track(slug.to_string());
        if let Some(CacheValue::Track(track)) = self.cached(&key).await {
            return Ok(*track);
        }

        let url = self.endpoint(&format!("tracks/{}/", segment(slug)))?;
        let mut track: Track = self.get_json(url, None).await?;
        track.resolve_media(self.media_origin());

        self.cache(key, CacheValue::Track(Box::new(track.clone())))
            .await;
        Ok(track)
    }

    /// Up to three other tracks from the same category.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, track), fields(slug = %track.slug))]
    pub async fn related_tracks(&self, track: &Track) -> Result<Vec<Track>, ApiError> {
        let Some(category) = &track.category else {
            return Ok(Vec::new());
        };

        let listing = self
            .tracks(vec![
                pair("category__slug", &category.slug),
                pair("page_size", "4"),
            ])
            .await?;

        Ok(listing
            .into_items()
            .into_iter()
            .filter(|candidate| candidate.id != track.id)
            .take(RELATED_LIMIT)
            .collect())
    }

    /// All collections, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        if let Some(CacheValue::Collections(collections)) =
            self.cached(&CacheKey::Collections).await
        {
            return Ok(collections);
        }

        let url = self.endpoint_with_query("collections/", &[pair("ordering", DEFAULT_ORDERING)])?;
        let listing: Listing<Collection> = self.get_json(url, None).await?;
        let mut collections = listing.into_items();
        for collection in &mut collections {
            collection.resolve_media(self.media_origin());
        }

        self.cache(
            CacheKey::Collections,
            CacheValue::Collections(collections.clone()),
        )
        .await;
        Ok(collections)
    }

    /// A single collection with its tracks.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no collection has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_collection(&self, slug: &str) -> Result<Collection, ApiError> {
        let key = CacheKey::Collection(slug.to_string());
        if let Some(CacheValue::Collection(collection)) = self.cached(&key).await {
            return Ok(*collection);
        }

        let url = self.endpoint(&format!("collections/{}/", segment(slug)))?;
        let mut collection: Collection = self.get_json(url, None).await?;
        collection.resolve_media(self.media_origin());

        self.cache(key, CacheValue::Collection(Box::new(collection.clone())))
            .await;
        Ok(collection)
    }

    /// All track categories.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) = self.cached(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let listing: Listing<Category> = self.get_json(self.endpoint("categories/")?, None).await?;
        let categories = listing.into_items();

        self.cache(
            CacheKey::Categories,
            CacheValue::Categories(categories.clone()),
        )
        .await;
        Ok(categories)
    }

    /// All tags, across every tag group.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<Tag>, ApiError> {
        if let Some(CacheValue::Tags(tags)) = self.cached(&CacheKey::Tags).await {
            return Ok(tags);
        }

        let listing: Listing<Tag> = self.get_json(self.endpoint("tags/")?, None).await?;
        let tags = listing.into_items();

        self.cache(CacheKey::Tags, CacheValue::Tags(tags.clone()))
            .await;
        Ok(tags)
    }

    /// Uncached round trip used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns error if the API is unreachable or unhealthy.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let _: Listing<Category> = self.get_json(self.endpoint("categories/")?, None).await?;
        Ok(())
    }

    async fn tracks(&self, pairs: Vec<(String, String)>) -> Result<Listing<Track>, ApiError> {
        let key = CacheKey::Tracks(encode(&pairs));
        if let Some(CacheValue::Tracks(listing)) = self.cached(&key).await {
            return Ok(listing);
        }

        let url = self.endpoint_with_query("tracks/", &pairs)?;
        let mut listing: Listing<Track> = self.get_json(url, None).await?;
        for track in listing.items_mut() {
            track.resolve_media(self.media_origin());
        }

        self.cache(key, CacheValue::Tracks(listing.clone())).await;
        Ok(listing)
    }
}

fn pair(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}
