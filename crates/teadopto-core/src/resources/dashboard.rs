//! Aggregate figures for the home page and the admin panel.
//!
//! Each figure is fetched independently and the two views tolerate failures
//! differently: the home page reports pets and shelters failures but quietly
//! drops the adoptions figure, while the admin overview zeroes any figure it
//! could not load.

use serde_json::Value;

use crate::api::{ApiClient, ApiError};
use crate::resources::Listing;
use crate::resources::pets::{self, Pet};

/// Figures shown on the home page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomeStats {
    pub pets: u64,
    pub shelters: u64,
    /// Only fetched for signed-in users; `None` when skipped or failed
    pub adoptions: Option<u64>,
    /// Collections whose figure could not be loaded
    pub failed: Vec<&'static str>,
}

impl HomeStats {
    /// Page-level error, shown only when nothing useful loaded.
    pub fn error(&self) -> Option<String> {
        if self.failed.is_empty() || self.pets > 0 || self.shelters > 0 {
            return None;
        }
        Some(format!(
            "Could not load the {} figures. Check that the backend is running.",
            self.failed.join(" and ")
        ))
    }
}

/// Figures shown on the admin panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminOverview {
    pub users: u64,
    pub pets: u64,
    pub shelters: u64,
    pub adoptions: u64,
}

async fn count(client: &ApiClient, path: &str) -> Result<u64, ApiError> {
    let listing: Listing<Value> = client.get(path).await?.json()?;
    Ok(listing.count())
}

/// Loads the home page figures. Never fails; see [`HomeStats::failed`].
pub async fn home_stats(client: &ApiClient, authenticated: bool) -> HomeStats {
    let mut stats = HomeStats::default();

    match count(client, "pets/").await {
        Ok(n) => stats.pets = n,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load pets figure");
            stats.failed.push("pets");
        }
    }

    match count(client, "shelters/").await {
        Ok(n) => stats.shelters = n,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load shelters figure");
            stats.failed.push("shelters");
        }
    }

    if authenticated {
        match count(client, "adoptions/").await {
            Ok(n) => stats.adoptions = Some(n),
            Err(e) => tracing::debug!(error = %e, "adoptions figure unavailable"),
        }
    }

    stats
}

/// Loads the admin panel figures, counting failures as zero.
pub async fn admin_overview(client: &ApiClient) -> AdminOverview {
    let mut figures = [0_u64; 4];
    for (slot, path) in figures
        .iter_mut()
        .zip(["users/", "pets/", "shelters/", "adoptions/"])
    {
        *slot = count(client, path).await.unwrap_or_else(|e| {
            tracing::warn!(path, error = %e, "admin figure unavailable");
            0
        });
    }
    let [users, pets, shelters, adoptions] = figures;
    AdminOverview {
        users,
        pets,
        shelters,
        adoptions,
    }
}

/// Available pets from the first page, for the home page showcase.
///
/// # Errors
/// Propagates the backend or transport error.
pub async fn featured_pets(client: &ApiClient) -> Result<Vec<Pet>, ApiError> {
    let listing = pets::list(client, None).await?;
    Ok(listing
        .into_items()
        .into_iter()
        .filter(Pet::is_available)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_only_when_nothing_loaded() {
        let stats = HomeStats {
            failed: vec!["pets", "shelters"],
            ..HomeStats::default()
        };
        assert_eq!(
            stats.error().as_deref(),
            Some("Could not load the pets and shelters figures. Check that the backend is running.")
        );

        let partial = HomeStats {
            shelters: 4,
            failed: vec!["pets"],
            ..HomeStats::default()
        };
        assert_eq!(partial.error(), None);

        assert_eq!(HomeStats::default().error(), None);
    }
}
