//! Catalog page: track listing with the category and tag sidebar.
//!
//! Every sidebar entry is a plain link carrying the filter it would produce,
//! so the page works without scripts and any state is shareable by URL.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{RawQuery, State};
use proffmusic_core::filter::CATALOG_PATH;
use proffmusic_core::{CatalogFilter, Category, Listing, TagGroups, Track};
use tracing::instrument;

use super::tracks::TrackCard;
use crate::filters;
use crate::middleware::Layout;
use crate::state::AppState;

/// One sidebar entry.
#[derive(Clone, Debug)]
pub struct FilterLink {
    pub label: String,
    pub href: String,
    pub active: bool,
}

/// A titled group of tag links.
#[derive(Clone, Debug)]
pub struct TagSection {
    pub label: &'static str,
    pub tags: Vec<FilterLink>,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogTemplate {
    pub layout: Layout,
    pub tracks: Vec<TrackCard>,
    pub total: u64,
    pub categories: Vec<FilterLink>,
    pub tag_sections: Vec<TagSection>,
    pub has_active_filters: bool,
    pub clear_href: &'static str,
    pub search: String,
    /// Filter pairs carried by the search form besides `search` itself.
    pub hidden_fields: Vec<(String, String)>,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub page: u32,
    pub source: String,
    pub load_failed: bool,
}

fn category_links(filter: &CatalogFilter, categories: &[Category]) -> Vec<FilterLink> {
    categories
        .iter()
        .map(|category| FilterLink {
            label: category.name.clone(),
            href: filter.with_category_toggled(&category.slug).href(),
            active: filter.is_category_active(&category.slug),
        })
        .collect()
}

fn tag_sections(filter: &CatalogFilter, groups: &TagGroups) -> Vec<TagSection> {
    groups
        .sections()
        .into_iter()
        .map(|(tag_type, tags)| TagSection {
            label: tag_type.label(),
            tags: tags
                .iter()
                .map(|tag| FilterLink {
                    label: tag.name.clone(),
                    href: filter.with_tag_toggled(&tag.slug).href(),
                    active: filter.is_tag_active(&tag.slug),
                })
                .collect(),
        })
        .collect()
}

fn search_form_fields(filter: &CatalogFilter) -> Vec<(String, String)> {
    let mut rest = filter.clone();
    rest.search = None;
    rest.page = None;
    rest.query_pairs()
}

/// Previous and next page links for the current filter.
fn page_links(filter: &CatalogFilter, has_next: bool) -> (Option<String>, Option<String>) {
    let page = filter.page_number();
    (
        (page > 1).then(|| filter.with_page(page - 1).href()),
        has_next.then(|| filter.with_page(page.saturating_add(1)).href()),
    )
}

/// Display the catalog for the filter in the query string.
#[instrument(skip(state, layout))]
pub async fn index(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    layout: Layout,
) -> CatalogTemplate {
    let filter = CatalogFilter::from_query(query.as_deref().unwrap_or_default());
    let api = state.api();

    let (tracks, categories, tags) =
        tokio::join!(api.list_tracks(&filter), api.list_categories(), api.list_tags());

    let (listing, load_failed) = match tracks {
        Ok(listing) => (listing, false),
        Err(e) => {
            tracing::warn!("Failed to fetch catalog tracks: {e}");
            (Listing::<Track>::default(), true)
        }
    };
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch categories: {e}");
        Vec::new()
    });
    let tags = tags.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch tags: {e}");
        Vec::new()
    });

    let page = filter.page_number();
    let (prev_href, next_href) = page_links(&filter, listing.has_next());
    CatalogTemplate {
        layout,
        tracks: listing.items().iter().map(TrackCard::from).collect(),
        total: listing.total(),
        categories: category_links(&filter, &categories),
        tag_sections: tag_sections(&filter, &TagGroups::from_tags(&tags)),
        has_active_filters: filter.has_active_filters(),
        clear_href: CATALOG_PATH,
        search: filter.search.clone().unwrap_or_default(),
        hidden_fields: search_form_fields(&filter),
        prev_href,
        next_href,
        page,
        source: format!("catalog:{}", filter.to_query_string()),
        load_failed,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proffmusic_core::{CategoryId, Tag, TagId, TagType};

    fn category(id: u32, slug: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: slug.to_uppercase(),
            slug: slug.into(),
        }
    }

    fn tag(id: u32, slug: &str, tag_type: TagType) -> Tag {
        Tag {
            id: TagId::new(id),
            name: slug.into(),
            slug: slug.into(),
            tag_type,
        }
    }

    #[test]
    fn test_category_links_toggle_and_reset_page() {
        let filter = CatalogFilter::from_query("category__slug=rock&page=3");
        let links = category_links(&filter, &[category(1, "rock"), category(2, "jazz")]);

        assert!(links[0].active);
        assert_eq!(links[0].href, "/music");
        assert!(!links[1].active);
        assert_eq!(links[1].href, "/music?category__slug=jazz");
    }

    #[test]
    fn test_tag_links_keep_other_tags() {
        let filter = CatalogFilter::from_query("tags__slug=calm");
        let groups = TagGroups::from_tags(&[
            tag(1, "calm", TagType::Mood),
            tag(2, "piano", TagType::Instrument),
        ]);
        let sections = tag_sections(&filter, &groups);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].label, "Mood");
        assert!(sections[0].tags[0].active);
        assert_eq!(sections[0].tags[0].href, "/music");
        assert_eq!(
            sections[1].tags[0].href,
            "/music?tags__slug=calm%2Cpiano"
        );
    }

    #[test]
    fn test_search_form_keeps_filters_but_not_page() {
        let filter = CatalogFilter::from_query("search=rain&category__slug=ambient&page=2");
        assert_eq!(
            search_form_fields(&filter),
            vec![("category__slug".to_string(), "ambient".to_string())]
        );
    }

    #[test]
    fn test_page_links() {
        let (prev, next) = page_links(&CatalogFilter::from_query("category__slug=lofi"), true);
        assert!(prev.is_none());
        let next = next.unwrap();
        assert!(next.contains("category__slug=lofi"));
        assert!(next.contains("page=2"));

        let (prev, next) = page_links(&CatalogFilter::from_query("page=2"), false);
        assert_eq!(prev.as_deref(), Some("/music"));
        assert!(next.is_none());

        let last = CatalogFilter::from_query(&format!("page={}", u32::MAX));
        let (_, next) = page_links(&last, true);
        assert_eq!(next, Some(format!("/music?page={}", u32::MAX)));
    }
}
