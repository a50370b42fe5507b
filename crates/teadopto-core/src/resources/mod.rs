//! Typed operations on the backend's resource collections.
//!
//! Each submodule wraps one collection (`pets/`, `shelters/`,
//! `adoptions/`, `users/`) with free functions taking an [`ApiClient`].
//! Collection reads accept both raw arrays and page envelopes.
//!
//! [`ApiClient`]: crate::api::ApiClient

pub mod adoptions;
pub mod dashboard;
pub mod listing;
pub mod pets;
pub mod photo;
pub mod registration;
pub mod shelters;
pub mod users;

pub use listing::{Listing, Page};
pub use photo::Photo;

/// Builds a collection path with an optional `?page=` query.
pub(crate) fn collection_path(collection: &str, page: Option<u32>) -> String {
    match page {
        Some(page) => format!("{collection}?page={page}"),
        None => collection.to_string(),
    }
}

/// Builds a detail path such as `pets/3/`.
pub(crate) fn detail_path(collection: &str, id: u64) -> String {
    format!("{collection}{id}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(collection_path("pets/", None), "pets/");
        assert_eq!(collection_path("pets/", Some(2)), "pets/?page=2");
        assert_eq!(detail_path("adoptions/", 14), "adoptions/14/");
    }
}
