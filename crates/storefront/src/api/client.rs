//! HTTP plumbing shared by all music API calls.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::ApiError;
use super::cache::{CacheKey, CacheValue};
use crate::config::ApiConfig;

/// Client for the ProffMusic REST API.
///
/// Catalog reads (categories, tags, tracks, collections) are cached for the
/// configured TTL. Account and order calls are never cached.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    media_origin: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("proffmusic-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                media_origin: config.media_origin.clone(),
                cache,
            }),
        })
    }

    /// API root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Origin that relative media paths are resolved against.
    #[must_use]
    pub fn media_origin(&self) -> &str {
        &self.inner.media_origin
    }

    /// Resolve a path relative to the API root, e.g. `"tracks/"`.
    pub(super) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Resolve a path and append query pairs.
    pub(super) fn endpoint_with_query(
        &self,
        path: &str,
        pairs: &[(String, String)],
    ) -> Result<Url, ApiError> {
        let mut url = self.endpoint(path)?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    pub(super) async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let value = self.inner.cache.get(key).await;
        if value.is_some() {
            debug!(?key, "Cache hit");
        }
        value
    }

    pub(super) async fn cache(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    /// `GET` a JSON document.
    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        access: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, url, access);
        let body = self.send(request, access.is_some()).await?;
        parse(&body)
    }

    /// `POST` a JSON body and parse the JSON answer.
    pub(super) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
        access: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::POST, url, access).json(body);
        let text = self.send(request, access.is_some()).await?;
        parse(&text)
    }

    /// `POST` a JSON body and discard the answer.
    pub(super) async fn post_json_discard<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
        access: Option<&str>,
    ) -> Result<(), ApiError> {
        let request = self.request(Method::POST, url, access).json(body);
        self.send(request, access.is_some()).await.map(drop)
    }

    pub(super) fn request(&self, method: Method, url: Url, access: Option<&str>) -> RequestBuilder {
        let request = self.inner.client.request(method, url);
        match access {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and return the body of a successful response.
    ///
    /// 404 becomes [`ApiError::NotFound`]. 401 becomes
    /// [`ApiError::Unauthorized`] only for requests that carried a token;
    /// an unauthenticated 401 (bad login) keeps its body for the message.
    pub(super) async fn send(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let path = response.url().path().to_string();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        match status {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(path)),
            StatusCode::UNAUTHORIZED if authenticated => Err(ApiError::Unauthorized),
            _ => {
                if status.is_server_error() {
                    tracing::error!(
                        status = %status,
                        path = %path,
                        body = %text.chars().take(500).collect::<String>(),
                        "Music API returned server error"
                    );
                } else {
                    debug!(status = %status, path = %path, "Music API rejected request");
                }
                Err(ApiError::from_response(status.as_u16(), &text))
            }
        }
    }
}

/// Parse a JSON body, logging the head of anything that does not fit.
pub(super) fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse music API response"
        );
        ApiError::Parse(e.to_string())
    })
}

/// Encode a slug as a single path segment.
pub(super) fn segment(slug: &str) -> String {
    urlencoding::encode(slug).into_owned()
}
