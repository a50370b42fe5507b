//! Media URL resolution.
//!
//! The backend serves uploaded photos from its root (`/media/...`), not from
//! under the API prefix, so relative media paths are joined onto the API base
//! with its `/api` suffix stripped.

/// Returns the backend root derived from the API base URL.
///
/// `http://127.0.0.1:8000/api/` becomes `http://127.0.0.1:8000`.
pub fn backend_root(api_base_url: &str) -> &str {
    let trimmed = api_base_url.trim_end_matches('/');
    trimmed.strip_suffix("/api").unwrap_or(trimmed)
}

/// Resolves a media reference into an absolute URL.
///
/// Absolute `http(s)` references pass through untouched; empty references
/// resolve to nothing.
pub fn media_url(api_base_url: &str, path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }

    let root = backend_root(api_base_url);
    if path.starts_with('/') {
        Some(format!("{root}{path}"))
    } else {
        Some(format!("{root}/{path}"))
    }
}
