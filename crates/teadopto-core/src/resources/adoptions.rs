//! Adoption requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{ApiClient, ApiError};
use crate::resources::{Listing, detail_path};
use crate::session::{Role, UserProfile};

const ADOPTIONS_PATH: &str = "adoptions/";

/// Fallback when creating a request fails without a usable backend message.
pub const CREATE_FAILED_MESSAGE: &str = "Could not create the adoption request.";

/// Review state of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl AdoptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AdoptionStatus::Pending => "pending",
            AdoptionStatus::Approved => "approved",
            AdoptionStatus::Rejected => "rejected",
            AdoptionStatus::Completed => "completed",
        }
    }
}

impl FromStr for AdoptionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "completed" => Ok(Self::Completed),
            _ => Err(format!(
                "Unknown adoption status: {value} (expected pending, approved, rejected or completed)"
            )),
        }
    }
}

impl fmt::Display for AdoptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptionRequest {
    pub id: u64,
    pub pet: u64,
    #[serde(default)]
    pub user: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    AdoptionStatus::Pending.as_str().to_string()
}

impl AdoptionRequest {
    pub fn is_pending(&self) -> bool {
        self.status == AdoptionStatus::Pending.as_str()
    }

    /// Clients may edit or withdraw their own requests while pending.
    pub fn editable_by(&self, user: &UserProfile) -> bool {
        user.role == Role::Client && self.is_pending() && self.user.is_none_or(|u| u == user.id)
    }
}

/// Whether `role` may change a request's review state.
pub fn can_review(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Shelter)
}

/// Requests visible to the current user (their own, or all for staff).
///
/// # Errors
/// Propagates the backend or transport error.
pub async fn list(client: &ApiClient) -> Result<Listing<AdoptionRequest>, ApiError> {
    client.get(ADOPTIONS_PATH).await?.json()
}

/// Asks to adopt `pet`.
///
/// # Errors
/// Propagates the backend or transport error; see
/// [`ApiError::user_message`] for the text to show.
pub async fn create(
    client: &ApiClient,
    pet: u64,
    message: Option<&str>,
) -> Result<AdoptionRequest, ApiError> {
    let body = json!({ "pet": pet, "message": message.unwrap_or_default() });
    let request: AdoptionRequest = client.post(ADOPTIONS_PATH, body).await?.json()?;
    tracing::info!(id = request.id, pet, "adoption request created");
    Ok(request)
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn update_message(
    client: &ApiClient,
    id: u64,
    message: &str,
) -> Result<AdoptionRequest, ApiError> {
    client
        .patch(&detail_path(ADOPTIONS_PATH, id), json!({ "message": message }))
        .await?
        .json()
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn set_status(
    client: &ApiClient,
    id: u64,
    status: AdoptionStatus,
) -> Result<AdoptionRequest, ApiError> {
    let request = client
        .patch(
            &detail_path(ADOPTIONS_PATH, id),
            json!({ "status": status.as_str() }),
        )
        .await?
        .json()?;
    tracing::info!(id, %status, "adoption request status changed");
    Ok(request)
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn delete(client: &ApiClient, id: u64) -> Result<(), ApiError> {
    client.delete(&detail_path(ADOPTIONS_PATH, id)).await?;
    tracing::info!(id, "adoption request deleted");
    Ok(())
}
