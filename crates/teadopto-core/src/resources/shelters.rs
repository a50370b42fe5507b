//! Animal shelters.

use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError};
use crate::resources::{Listing, Photo, collection_path, detail_path};

const SHELTERS_PATH: &str = "shelters/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub verified: bool,
    /// Owning user account
    #[serde(default)]
    pub user: Option<u64>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl Shelter {
    pub fn display_photo(&self) -> Option<&str> {
        self.photo_url
            .as_deref()
            .or(self.photo.as_deref())
            .filter(|url| !url.is_empty())
    }
}

/// Data for creating or editing a shelter.
#[derive(Debug, Clone, Default)]
pub struct ShelterForm {
    pub name: String,
    pub address: Option<String>,
    pub verified: bool,
    /// Owning user account (admins only)
    pub user: Option<u64>,
    pub photo: Option<Photo>,
}

impl ShelterForm {
    fn into_multipart(self) -> Result<Form, ApiError> {
        let mut form = Form::new().text("name", self.name);
        if let Some(address) = self.address.filter(|a| !a.trim().is_empty()) {
            form = form.text("address", address);
        }
        form = form.text("verified", self.verified.to_string());
        if let Some(user) = self.user {
            form = form.text("user", user.to_string());
        }
        if let Some(photo) = self.photo {
            form = form.part("photo", photo.into_part()?);
        }
        Ok(form)
    }
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn list(client: &ApiClient, page: Option<u32>) -> Result<Listing<Shelter>, ApiError> {
    client
        .get(&collection_path(SHELTERS_PATH, page))
        .await?
        .json()
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn get(client: &ApiClient, id: u64) -> Result<Shelter, ApiError> {
    client.get(&detail_path(SHELTERS_PATH, id)).await?.json()
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn create(client: &ApiClient, form: ShelterForm) -> Result<Shelter, ApiError> {
    let shelter: Shelter = client
        .post(SHELTERS_PATH, form.into_multipart()?)
        .await?
        .json()?;
    tracing::info!(id = shelter.id, name = %shelter.name, "shelter created");
    Ok(shelter)
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn update(client: &ApiClient, id: u64, form: ShelterForm) -> Result<Shelter, ApiError> {
    client
        .patch(&detail_path(SHELTERS_PATH, id), form.into_multipart()?)
        .await?
        .json()
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn delete(client: &ApiClient, id: u64) -> Result<(), ApiError> {
    client.delete(&detail_path(SHELTERS_PATH, id)).await?;
    tracing::info!(id, "shelter deleted");
    Ok(())
}
