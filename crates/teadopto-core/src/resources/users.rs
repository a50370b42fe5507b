//! User accounts (admin only, apart from `me`).

use serde::Serialize;

use crate::api::{ApiClient, ApiError, RequestBody};
use crate::resources::{Listing, detail_path};
use crate::session::{Role, UserProfile};

const USERS_PATH: &str = "users/";
const ME_PATH: &str = "users/me/";

/// Partial update of an account. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.role.is_none() && self.phone.is_none()
    }
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn list(client: &ApiClient) -> Result<Listing<UserProfile>, ApiError> {
    client.get(USERS_PATH).await?.json()
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn get(client: &ApiClient, id: u64) -> Result<UserProfile, ApiError> {
    client.get(&detail_path(USERS_PATH, id)).await?.json()
}

/// Profile of the account behind the stored credential.
///
/// # Errors
/// Propagates the backend or transport error.
pub async fn me(client: &ApiClient) -> Result<UserProfile, ApiError> {
    client.get(ME_PATH).await?.json()
}

/// # Errors
/// Returns `InvalidRequest` for an empty update; otherwise propagates the
/// backend or transport error.
pub async fn update(
    client: &ApiClient,
    id: u64,
    changes: &UserUpdate,
) -> Result<UserProfile, ApiError> {
    if changes.is_empty() {
        return Err(ApiError::invalid_request("Nothing to update."));
    }
    client
        .patch(&detail_path(USERS_PATH, id), RequestBody::json(changes)?)
        .await?
        .json()
}

/// # Errors
/// Propagates the backend or transport error.
pub async fn delete(client: &ApiClient, id: u64) -> Result<(), ApiError> {
    client.delete(&detail_path(USERS_PATH, id)).await?;
    tracing::info!(id, "user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_update_serializes_only_set_fields() {
        let changes = UserUpdate {
            role: Some(Role::Shelter),
            ..UserUpdate::default()
        };
        assert_eq!(serde_json::to_value(&changes).unwrap(), json!({"role": "shelter"}));
        assert!(!changes.is_empty());
        assert!(UserUpdate::default().is_empty());
    }
}
