//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use super::tracks::TrackCard;
use crate::filters;
use crate::middleware::Layout;
use crate::state::AppState;

/// How many new releases the hero strip shows.
const NEW_RELEASES_LIMIT: usize = 8;

/// Library pagination query.
///
/// Kept as text so a mangled `?page=` falls back to the first page
/// instead of failing the request.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Requested page, 1 when absent or not a positive number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }
}

/// Library pager links.
#[derive(Clone, Debug, Default)]
pub struct Pager {
    pub page: u32,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

impl Pager {
    fn library(page: u32, has_prev: bool, has_next: bool) -> Self {
        let href = |page: u32| {
            if page <= 1 {
                "/#library".to_string()
            } else {
                format!("/?page={page}#library")
            }
        };
        Self {
            page,
            prev_href: (has_prev && page > 1).then(|| href(page - 1)),
            next_href: has_next.then(|| href(page.saturating_add(1))),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub new_releases: Vec<TrackCard>,
    pub library: Vec<TrackCard>,
    pub pager: Pager,
    pub library_source: String,
}

/// Display the home page: new releases and one page of the full library.
#[instrument(skip(state, layout))]
pub async fn home(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    layout: Layout,
) -> HomeTemplate {
    let page = query.page();

    let new_releases = state.api().new_releases().await.map_or_else(
        |e| {
            tracing::warn!("Failed to fetch new releases: {e}");
            Vec::new()
        },
        |tracks| {
            tracks
                .iter()
                .take(NEW_RELEASES_LIMIT)
                .map(TrackCard::from)
                .collect()
        },
    );

    let (library, pager) = match state.api().library_page(page).await {
        Ok(listing) => (
            listing.items().iter().map(TrackCard::from).collect(),
            Pager::library(page, listing.has_previous(), listing.has_next()),
        ),
        Err(e) => {
            tracing::warn!("Failed to fetch library page {page}: {e}");
            (Vec::new(), Pager::library(page, page > 1, false))
        }
    };

    HomeTemplate {
        layout,
        new_releases,
        library,
        pager,
        library_source: format!("library:{page}"),
    }
}
