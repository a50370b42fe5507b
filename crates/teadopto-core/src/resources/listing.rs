//! Collection responses.
//!
//! The backend paginates some collections and not others, so a listing is
//! either a raw array or a `{count, next, previous, results}` envelope.

use serde::Deserialize;

/// One page of a paginated collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// A collection response in either shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page(Page<T>),
    Items(Vec<T>),
}

impl<T> Listing<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Listing::Page(page) => &page.results,
            Listing::Items(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Page(page) => page.results,
            Listing::Items(items) => items,
        }
    }

    /// Total size of the collection: the envelope's `count` when present,
    /// otherwise the number of items received.
    pub fn count(&self) -> u64 {
        match self {
            Listing::Page(page) => page.count.unwrap_or(page.results.len() as u64),
            Listing::Items(items) => items.len() as u64,
        }
    }

    pub fn has_next(&self) -> bool {
        matches!(self, Listing::Page(Page { next: Some(_), .. }))
    }

    pub fn has_previous(&self) -> bool {
        matches!(self, Listing::Page(Page { previous: Some(_), .. }))
    }
}
