//! Catalog filter state, synchronized with the `/music` query string.
//!
//! The sidebar is a set of plain links: every category or tag link carries the
//! full filter it would produce, so the filter must round-trip through the URL
//! without losing anything. Keys this type does not understand are kept
//! verbatim and passed on to the API.

use core::str::FromStr;

use rust_decimal::Decimal;
use url::form_urlencoded;

/// Path of the catalog page.
pub const CATALOG_PATH: &str = "/music";

/// Ordering always requested from the API for catalog listings.
pub const DEFAULT_ORDERING: &str = "-created_at";

const CATEGORY: &str = "category__slug";
const TAGS: &str = "tags__slug";
const IS_NEW: &str = "is_new";
const PRICE_MIN: &str = "price_min";
const PRICE_MAX: &str = "price_max";
const SEARCH: &str = "search";
const PAGE: &str = "page";
const ORDERING: &str = "ordering";

/// Parsed catalog filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_new: Option<bool>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub search: Option<String>,
    pub page: Option<u32>,
    extra: Vec<(String, String)>,
}

impl CatalogFilter {
    /// Parse a raw query string (without the leading `?`).
    ///
    /// Parsing is lenient: empty values, unparseable numbers and page
    /// numbers below 1 are dropped rather than rejected. For repeated known
    /// keys the last occurrence wins.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut filter = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                CATEGORY => filter.category = non_empty(value),
                TAGS => filter.tags = split_tags(value),
                IS_NEW => filter.is_new = parse_bool(value),
                PRICE_MIN => filter.price_min = Decimal::from_str(value).ok(),
                PRICE_MAX => filter.price_max = Decimal::from_str(value).ok(),
                SEARCH => filter.search = non_empty(value),
                PAGE => filter.page = value.parse::<u32>().ok().filter(|page| *page >= 1),
                // The catalog is always newest first.
                ORDERING => {}
                _ => filter.extra.push((key.into_owned(), value.to_owned())),
            }
        }
        filter
    }

    /// Select `slug`, or clear the category when `slug` is already selected.
    pub fn toggle_category(&mut self, slug: &str) {
        if self.category.as_deref() == Some(slug) {
            self.category = None;
        } else {
            self.category = Some(slug.to_owned());
        }
        self.page = None;
    }

    /// Add `slug` to the tag list, or remove it when present.
    pub fn toggle_tag(&mut self, slug: &str) {
        if let Some(index) = self.tags.iter().position(|tag| tag == slug) {
            self.tags.remove(index);
        } else if !slug.is_empty() {
            self.tags.push(slug.to_owned());
        }
        self.page = None;
    }

    /// Reset to the unfiltered catalog.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Copy with the category toggled, for building sidebar links.
    #[must_use]
    pub fn with_category_toggled(&self, slug: &str) -> Self {
        let mut next = self.clone();
        next.toggle_category(slug);
        next
    }

    #[must_use]
    pub fn with_tag_toggled(&self, slug: &str) -> Self {
        let mut next = self.clone();
        next.toggle_tag(slug);
        next
    }

    /// Copy pointing at another results page. Page 1 is written as no page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        let mut next = self.clone();
        next.page = (page > 1).then_some(page);
        next
    }

    /// Current page number, 1-based.
    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    #[must_use]
    pub fn is_category_active(&self, slug: &str) -> bool {
        self.category.as_deref() == Some(slug)
    }

    #[must_use]
    pub fn is_tag_active(&self, slug: &str) -> bool {
        self.tags.iter().any(|tag| tag == slug)
    }

    /// Whether the sidebar has something to clear.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        self.category.is_some() || !self.tags.is_empty()
    }

    /// Keys this type does not interpret, in their original order.
    #[must_use]
    pub fn extra(&self) -> &[(String, String)] {
        &self.extra
    }

    /// Canonical storefront query pairs.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.filter_pairs();
        if let Some(page) = self.page {
            pairs.push((PAGE.to_owned(), page.to_string()));
        }
        pairs.extend(self.extra.iter().cloned());
        pairs
    }

    /// Canonical query string; empty when nothing is set.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        encode(&self.query_pairs())
    }

    /// Link to the catalog page with this filter applied.
    #[must_use]
    pub fn href(&self) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            CATALOG_PATH.to_owned()
        } else {
            format!("{CATALOG_PATH}?{query}")
        }
    }

    /// Pairs sent to the tracks endpoint, always ordered newest first.
    #[must_use]
    pub fn api_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.query_pairs();
        pairs.push((ORDERING.to_owned(), DEFAULT_ORDERING.to_owned()));
        pairs
    }

    fn filter_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = &self.category {
            pairs.push((CATEGORY.to_owned(), category.clone()));
        }
        if !self.tags.is_empty() {
            pairs.push((TAGS.to_owned(), self.tags.join(",")));
        }
        if let Some(is_new) = self.is_new {
            pairs.push((IS_NEW.to_owned(), is_new.to_string()));
        }
        if let Some(min) = self.price_min {
            pairs.push((PRICE_MIN.to_owned(), min.to_string()));
        }
        if let Some(max) = self.price_max {
            pairs.push((PRICE_MAX.to_owned(), max.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push((SEARCH.to_owned(), search.clone()));
        }
        pairs
    }
}

/// Encode pairs as `application/x-www-form-urlencoded`.
#[must_use]
pub fn encode(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

fn split_tags(value: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in value.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_owned());
        }
    }
    tags
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_keys() {
        let filter = CatalogFilter::from_query(
            "category__slug=ambient&tags__slug=calm,,piano&is_new=true&price_min=100&page=3",
        );
        assert_eq!(filter.category.as_deref(), Some("ambient"));
        assert_eq!(filter.tags, vec!["calm", "piano"]);
        assert_eq!(filter.is_new, Some(true));
        assert_eq!(filter.price_min, Some(Decimal::from(100)));
        assert_eq!(filter.page, Some(3));
        assert!(filter.has_active_filters());
    }

    #[test]
    fn test_lenient_parsing() {
        let filter = CatalogFilter::from_query("?category__slug=&page=0&price_max=cheap&is_new=maybe");
        assert_eq!(filter, CatalogFilter::default());
        assert!(!filter.has_active_filters());
    }

    #[test]
    fn test_unknown_keys_are_preserved_in_order() {
        let filter = CatalogFilter::from_query("utm_source=mail&tags__slug=rock&ref=x");
        assert_eq!(
            filter.extra(),
            &[
                ("utm_source".to_owned(), "mail".to_owned()),
                ("ref".to_owned(), "x".to_owned())
            ]
        );
        assert_eq!(filter.to_query_string(), "tags__slug=rock&utm_source=mail&ref=x");
    }

    #[test]
    fn test_toggle_category() {
        let mut filter = CatalogFilter::from_query("category__slug=pop&page=2");
        filter.toggle_category("rock");
        assert_eq!(filter.category.as_deref(), Some("rock"));
        assert_eq!(filter.page, None);
        filter.toggle_category("rock");
        assert_eq!(filter.category, None);
    }

    #[test]
    fn test_toggle_tag_preserves_order() {
        let mut filter = CatalogFilter::from_query("tags__slug=a,b,c");
        filter.toggle_tag("b");
        assert_eq!(filter.tags, vec!["a", "c"]);
        filter.toggle_tag("d");
        assert_eq!(filter.tags, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_removing_last_tag_drops_key() {
        let filter = CatalogFilter::from_query("tags__slug=solo&page=4");
        let next = filter.with_tag_toggled("solo");
        assert_eq!(next.href(), "/music");
    }

    #[test]
    fn test_any_change_resets_page() {
        let filter = CatalogFilter::from_query("page=5");
        assert_eq!(filter.with_category_toggled("pop").page, None);
        assert_eq!(filter.with_tag_toggled("calm").page, None);
    }

    #[test]
    fn test_round_trip_through_query_string() {
        let mut filter = CatalogFilter::default();
        filter.toggle_category("lo fi");
        filter.toggle_tag("calm");
        filter.toggle_tag("piano");
        let href = filter.href();
        assert_eq!(href, "/music?category__slug=lo+fi&tags__slug=calm%2Cpiano");

        let query = href.split_once('?').unwrap().1;
        assert_eq!(CatalogFilter::from_query(query), filter);
    }

    #[test]
    fn test_clear() {
        let mut filter = CatalogFilter::from_query("category__slug=pop&tags__slug=x&search=rain");
        filter.clear();
        assert_eq!(filter.href(), "/music");
    }

    #[test]
    fn test_api_pairs_force_ordering() {
        let filter = CatalogFilter::from_query("ordering=price&category__slug=pop");
        let pairs = filter.api_pairs();
        assert_eq!(
            pairs,
            vec![
                ("category__slug".to_owned(), "pop".to_owned()),
                ("ordering".to_owned(), "-created_at".to_owned()),
            ]
        );
    }

    #[test]
    fn test_with_page() {
        let filter = CatalogFilter::from_query("category__slug=pop");
        assert_eq!(filter.with_page(2).href(), "/music?category__slug=pop&page=2");
        assert_eq!(filter.with_page(1).href(), "/music?category__slug=pop");
        assert_eq!(filter.with_page(2).page_number(), 2);
    }
}
