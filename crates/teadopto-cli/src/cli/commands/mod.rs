//! CLI command handlers.

use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow, bail};
use comfy_table::{ContentArrangement, Table};
use teadopto_core::api::{ApiClient, ApiError};
use teadopto_core::config::Config;
use teadopto_core::media::media_url;
use teadopto_core::resources::Listing;
use teadopto_core::session::SessionStore;
use teadopto_core::storage::{FileStorage, SessionStorage};

pub mod adoptions;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod media;
pub mod pets;
pub mod shelters;
pub mod users;

/// Printed when the backend rejects the stored credential mid-command.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// Loaded configuration plus the session restored from disk.
pub struct Context {
    config: Config,
    store: SessionStore,
}

impl Context {
    pub fn open(config: Config) -> Result<Self> {
        let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::default_location());
        let client = ApiClient::from_config(&config, storage).context("build API client")?;
        Ok(Self {
            store: SessionStore::new(client),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn client(&self) -> &ApiClient {
        self.store.client()
    }

    /// Absolute URL for a media reference, empty when there is none.
    pub fn media_url(&self, path: Option<&str>) -> String {
        path.and_then(|p| media_url(self.client().base_url().as_str(), p))
            .unwrap_or_default()
    }

    pub fn require_login(&self) -> Result<()> {
        if !self.store.is_authenticated() {
            bail!("Login required. Run `teadopto login` first.");
        }
        Ok(())
    }

    pub fn require_admin(&self) -> Result<()> {
        self.require_login()?;
        if !self.store.is_admin() {
            bail!("Admin access required.");
        }
        Ok(())
    }

    pub fn require_staff(&self) -> Result<()> {
        self.require_login()?;
        if !(self.store.is_admin() || self.store.is_shelter()) {
            bail!("Shelter or admin access required.");
        }
        Ok(())
    }
}

/// Turns backend failures into the line shown to the user.
pub trait ApiResultExt<T> {
    /// Uses the backend's own message, or `fallback` when it has none.
    fn or_report(self, fallback: &str) -> Result<T>;

    /// Uses a caller-built message.
    fn or_report_with(self, message: impl FnOnce(&ApiError) -> String) -> Result<T>;
}

impl<T> ApiResultExt<T> for std::result::Result<T, ApiError> {
    fn or_report(self, fallback: &str) -> Result<T> {
        self.or_report_with(|e| e.user_message(fallback))
    }

    fn or_report_with(self, message: impl FnOnce(&ApiError) -> String) -> Result<T> {
        self.map_err(|e| {
            tracing::debug!(error = %e, "command failed");
            if e.is_unauthorized() {
                anyhow!(SESSION_EXPIRED_MESSAGE)
            } else {
                anyhow!(message(&e))
            }
        })
    }
}

/// Items of a secondary listing, or none when it fails. An expired session
/// still aborts the command.
pub(crate) fn items_or_empty<T>(
    result: std::result::Result<Listing<T>, ApiError>,
    what: &str,
) -> Result<Vec<T>> {
    match result {
        Ok(listing) => Ok(listing.into_items()),
        Err(e) if e.is_unauthorized() => Err(anyhow!(SESSION_EXPIRED_MESSAGE)),
        Err(e) => {
            tracing::warn!(error = %e, what, "lookup failed; continuing without it");
            Ok(Vec::new())
        }
    }
}

pub(crate) fn print_table<const N: usize>(header: [&str; N], rows: Vec<[String; N]>) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

/// Prints the "N of M" line under a listing, with the next page when there is one.
pub(crate) fn print_page_footer<T>(listing: &Listing<T>, page: Option<u32>) {
    let shown = listing.items().len();
    let total = listing.count();
    let page = page.unwrap_or(1);
    if listing.has_next() {
        println!(
            "Showing {shown} of {total} (page {page}). Next: --page {}",
            page + 1
        );
    } else {
        println!("Showing {shown} of {total}.");
    }
}

pub(crate) fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}
