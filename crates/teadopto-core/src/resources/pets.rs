//! Pets listed for adoption.

use std::fmt;
use std::str::FromStr;

use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError, ApiErrorKind, UNREACHABLE_MESSAGE, first_message};
use crate::resources::adoptions::AdoptionRequest;
use crate::resources::shelters::Shelter;
use crate::resources::{Listing, Photo, collection_path, detail_path};
use crate::session::{Role, UserProfile};

const PETS_PATH: &str = "pets/";

/// Fallback when saving a pet fails without a usable backend message.
pub const SAVE_FAILED_MESSAGE: &str = "Could not save the pet. Check the data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetType {
    Dog,
    Cat,
}

impl PetType {
    pub fn as_str(self) -> &'static str {
        match self {
            PetType::Dog => "dog",
            PetType::Cat => "cat",
        }
    }
}

impl FromStr for PetType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dog" => Ok(Self::Dog),
            "cat" => Ok(Self::Cat),
            _ => Err(format!("Unknown pet type: {value} (expected dog or cat)")),
        }
    }
}

impl fmt::Display for PetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeUnit {
    Months,
    #[default]
    Years,
}

impl AgeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            AgeUnit::Months => "months",
            AgeUnit::Years => "years",
        }
    }
}

impl FromStr for AgeUnit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "months" | "month" => Ok(Self::Months),
            "years" | "year" => Ok(Self::Years),
            _ => Err(format!("Unknown age unit: {value} (expected months or years)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    #[default]
    Available,
    Adopted,
    Pending,
}

impl PetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PetStatus::Available => "available",
            PetStatus::Adopted => "adopted",
            PetStatus::Pending => "pending",
        }
    }
}

impl FromStr for PetStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "adopted" => Ok(Self::Adopted),
            "pending" => Ok(Self::Pending),
            _ => Err(format!(
                "Unknown pet status: {value} (expected available, adopted or pending)"
            )),
        }
    }
}

/// One uploaded photo of a pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetPhoto {
    pub id: u64,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub order: i64,
}

/// A pet as returned by the backend.
///
/// Text fields are lenient: the backend sends blanks, nulls or omits them
/// depending on how the record was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub pet_type: String,
    #[serde(default)]
    pub breed: Option<String>,
    /// Signed on the backend; bad records must not break a listing
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub age_unit: Option<String>,
    #[serde(default)]
    pub age_display: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub shelter: Option<u64>,
    #[serde(default)]
    pub owner: Option<u64>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub photos: Vec<PetPhoto>,
    #[serde(default)]
    pub primary_photo_url: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    PetStatus::Available.as_str().to_string()
}

impl Pet {
    pub fn is_available(&self) -> bool {
        self.status == PetStatus::Available.as_str()
    }

    /// The photo to show first: the backend's primary pick, then the first
    /// gallery photo, then the legacy single photo.
    pub fn primary_photo(&self) -> Option<&str> {
        self.primary_photo_url
            .as_deref()
            .or_else(|| self.photos.iter().find_map(|p| p.photo_url.as_deref()))
            .or(self.photo.as_deref())
            .filter(|url| !url.is_empty())
    }

    /// Human-readable age such as "1 year" or "5 months".
    pub fn age_label(&self) -> Option<String> {
        let age = self.age?;
        let unit = match self.age_unit.as_deref() {
            Some("months") => ("month", "months"),
            _ => ("year", "years"),
        };
        let word = if age == 1 { unit.0 } else { unit.1 };
        Some(format!("{age} {word}"))
    }
}

/// Data for creating or editing a pet.
#[derive(Debug, Clone, Default)]
pub struct PetForm {
    pub name: String,
    pub pet_type: Option<PetType>,
    pub breed: Option<String>,
    pub age: Option<u32>,
    pub age_unit: Option<AgeUnit>,
    pub size: Option<String>,
    pub description: Option<String>,
    pub status: PetStatus,
    pub photos: Vec<Photo>,
}

impl PetForm {
    pub fn new(name: impl Into<String>, pet_type: PetType) -> Self {
        Self {
            name: name.into(),
            pet_type: Some(pet_type),
            ..Self::default()
        }
    }

    /// Encodes the form as multipart. Blank optional fields are left out;
    /// `age_unit` accompanies `age` and defaults to years.
    fn into_multipart(self) -> Result<Form, ApiError> {
        let mut form = Form::new().text("name", self.name);
        form = form.text(
            "pet_type",
            self.pet_type.unwrap_or(PetType::Dog).as_str(),
        );
        if let Some(breed) = non_blank(self.breed) {
            form = form.text("breed", breed);
        }
        if let Some(age) = self.age.filter(|age| *age > 0) {
            form = form
                .text("age", age.to_string())
                .text("age_unit", self.age_unit.unwrap_or_default().as_str());
        }
        if let Some(size) = non_blank(self.size) {
            form = form.text("size", size);
        }
        if let Some(description) = non_blank(self.description) {
            form = form.text("description", description);
        }
        form = form.text("status", self.status.as_str());
        for photo in self.photos {
            form = form.part("photos", photo.into_part()?);
        }
        Ok(form)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn list(client: &ApiClient, page: Option<u32>) -> Result<Listing<Pet>, ApiError> {
    client.get(&collection_path(PETS_PATH, page)).await?.json()
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn get(client: &ApiClient, id: u64) -> Result<Pet, ApiError> {
    client.get(&detail_path(PETS_PATH, id)).await?.json()
}

/// Publishes a new pet. At least one photo is required.
///
/// # Errors
/// Returns `InvalidRequest` without contacting the backend when no photo is
/// attached; otherwise propagates the backend or transport error.
pub async fn create(client: &ApiClient, form: PetForm) -> Result<Pet, ApiError> {
    if form.photos.is_empty() {
        return Err(ApiError::invalid_request(
            "At least one photo is required for a new pet.",
        ));
    }
    let name = form.name.clone();
    let pet: Pet = client.post(PETS_PATH, form.into_multipart()?).await?.json()?;
    tracing::info!(id = pet.id, %name, "pet created");
    Ok(pet)
}

/// Edits a pet; photos, when given, are added to its gallery.
///
/// # Errors
/// Propagates the backend or transport error.
pub async fn update(client: &ApiClient, id: u64, form: PetForm) -> Result<Pet, ApiError> {
    client
        .patch(&detail_path(PETS_PATH, id), form.into_multipart()?)
        .await?
        .json()
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn delete(client: &ApiClient, id: u64) -> Result<(), ApiError> {
    client.delete(&detail_path(PETS_PATH, id)).await?;
    tracing::info!(id, "pet deleted");
    Ok(())
}

/// Message for a failed create or update.
pub fn save_error_message(err: &ApiError) -> String {
    if let Some(photo) = err
        .body
        .as_ref()
        .and_then(|b| b.get("photo"))
        .and_then(first_message)
    {
        return format!("Photo error: {photo}");
    }
    if let Some(detail) = err.detail() {
        return detail.to_string();
    }
    match err.kind {
        ApiErrorKind::Transport | ApiErrorKind::Timeout => UNREACHABLE_MESSAGE.to_string(),
        _ => SAVE_FAILED_MESSAGE.to_string(),
    }
}

fn own_shelter<'a>(user: &UserProfile, shelters: &'a [Shelter]) -> Option<&'a Shelter> {
    shelters.iter().find(|s| s.user == Some(user.id))
}

/// Whether `user` may edit or delete `pet`: admins always, shelters for
/// pets of their own shelter, clients for pets they own.
pub fn can_edit(user: &UserProfile, pet: &Pet, shelters: &[Shelter]) -> bool {
    match user.role {
        Role::Admin => true,
        Role::Shelter => {
            own_shelter(user, shelters).is_some_and(|s| pet.shelter == Some(s.id))
        }
        Role::Client => pet.owner == Some(user.id),
    }
}

/// Whether `user` may ask to adopt `pet`.
///
/// Only clients may, only for available pets they neither own nor host, and
/// only once per pet.
pub fn can_request_adoption(
    user: &UserProfile,
    pet: &Pet,
    shelters: &[Shelter],
    requests: &[AdoptionRequest],
) -> bool {
    if user.role != Role::Client || !pet.is_available() || pet.owner == Some(user.id) {
        return false;
    }
    if pet.shelter.is_some()
        && own_shelter(user, shelters).is_some_and(|s| pet.shelter == Some(s.id))
    {
        return false;
    }
    !requests.iter().any(|r| r.pet == pet.id)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pet(value: serde_json::Value) -> Pet {
        serde_json::from_value(value).unwrap()
    }

    fn user(id: u64, role: Role) -> UserProfile {
        UserProfile {
            id,
            username: format!("user{id}"),
            email: String::new(),
            role,
            phone: None,
        }
    }

    fn shelter(id: u64, owner: u64) -> Shelter {
        serde_json::from_value(json!({"id": id, "name": "Paws", "user": owner})).unwrap()
    }

    #[test]
    fn test_pet_decodes_sparse_record() {
        let pet = pet(json!({"id": 1, "name": "Rex", "breed": null}));
        assert!(pet.is_available());
        assert_eq!(pet.breed, None);
        assert_eq!(pet.primary_photo(), None);
        assert_eq!(pet.age_label(), None);
    }

    #[test]
    fn test_primary_photo_preference() {
        let pet = pet(json!({
            "id": 1,
            "name": "Rex",
            "photo": "/media/pets/dog/old.jpg",
            "photos": [{"id": 9, "photo_url": "http://127.0.0.1:8000/media/pets/dog/a.jpg"}]
        }));
        assert_eq!(
            pet.primary_photo(),
            Some("http://127.0.0.1:8000/media/pets/dog/a.jpg")
        );
    }

    #[test]
    fn test_age_label() {
        let one_year = pet(json!({"id": 1, "name": "Rex", "age": 1, "age_unit": "years"}));
        assert_eq!(one_year.age_label().as_deref(), Some("1 year"));
        let months = pet(json!({"id": 2, "name": "Mia", "age": 5, "age_unit": "months"}));
        assert_eq!(months.age_label().as_deref(), Some("5 months"));
        let blank_unit = pet(json!({"id": 3, "name": "Tom", "age": 3, "age_unit": ""}));
        assert_eq!(blank_unit.age_label().as_deref(), Some("3 years"));
    }

    #[test]
    fn test_negative_age_does_not_break_listing() {
        let listing: Listing<Pet> = serde_json::from_value(json!([
            {"id": 1, "name": "Rex", "age": -2},
            {"id": 2, "name": "Mia", "age": 4}
        ]))
        .unwrap();
        assert_eq!(listing.items().len(), 2);
        assert_eq!(listing.items()[0].age, Some(-2));
        assert_eq!(listing.items()[1].age_label().as_deref(), Some("4 years"));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Cat".parse::<PetType>(), Ok(PetType::Cat));
        assert!("parrot".parse::<PetType>().is_err());
        assert_eq!("month".parse::<AgeUnit>(), Ok(AgeUnit::Months));
        assert_eq!("adopted".parse::<PetStatus>(), Ok(PetStatus::Adopted));
    }

    #[test]
    fn test_save_error_message_prefers_photo() {
        let err = ApiError::http_status(
            400,
            json!({"photo": ["Upload a valid image."], "detail": "bad"}),
        );
        assert_eq!(save_error_message(&err), "Photo error: Upload a valid image.");

        let err = ApiError::http_status(500, serde_json::Value::Null);
        assert_eq!(save_error_message(&err), SAVE_FAILED_MESSAGE);
    }

    #[test]
    fn test_can_edit_rules() {
        let shelters = [shelter(3, 20)];
        let hosted = pet(json!({"id": 1, "name": "Rex", "shelter": 3}));
        let owned = pet(json!({"id": 2, "name": "Mia", "owner": 30}));

        assert!(can_edit(&user(1, Role::Admin), &hosted, &shelters));
        assert!(can_edit(&user(20, Role::Shelter), &hosted, &shelters));
        assert!(!can_edit(&user(21, Role::Shelter), &hosted, &shelters));
        assert!(can_edit(&user(30, Role::Client), &owned, &shelters));
        assert!(!can_edit(&user(31, Role::Client), &owned, &shelters));
    }

    #[test]
    fn test_can_request_adoption_rules() {
        let client = user(30, Role::Client);
        let available = pet(json!({"id": 1, "name": "Rex", "shelter": 3}));
        let adopted = pet(json!({"id": 2, "name": "Mia", "shelter": 3, "status": "adopted"}));
        let own = pet(json!({"id": 3, "name": "Tom", "owner": 30}));

        assert!(can_request_adoption(&client, &available, &[], &[]));
        assert!(!can_request_adoption(&client, &adopted, &[], &[]));
        assert!(!can_request_adoption(&client, &own, &[], &[]));
        assert!(!can_request_adoption(
            &user(20, Role::Shelter),
            &available,
            &[],
            &[]
        ));

        let existing: AdoptionRequest =
            serde_json::from_value(json!({"id": 5, "pet": 1, "user": 30})).unwrap();
        assert!(!can_request_adoption(&client, &available, &[], &[existing]));
    }
}
