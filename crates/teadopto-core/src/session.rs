//! Session store: current credentials, derived role flags and auth status.
//!
//! The store owns the in-memory session, persists it through a
//! [`SessionStorage`] and subscribes to the client's unauthorized signal so
//! an expired credential logs the user out wherever it is detected.
//!
//! Overlapping `login` calls are not serialized: whichever call finishes its
//! credential exchange and profile fetch last decides the final session.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{
    ApiClient, ApiError, ApiErrorKind, RequestConfig, UNREACHABLE_MESSAGE, UnauthorizedObserver,
};
use crate::storage::{SessionStorage, keys};

/// Shown when the backend rejects the username/password pair.
pub const INVALID_CREDENTIALS_MESSAGE: &str =
    "Incorrect username or password. Check your credentials.";
/// Shown when the backend rejects the login payload as malformed.
pub const INVALID_DATA_MESSAGE: &str = "Invalid data. Check the username and password format.";
/// Shown when nothing more specific is known.
pub const GENERIC_LOGIN_MESSAGE: &str = "Invalid credentials or server unavailable.";

const LOGIN_PATH: &str = "login/";
const PROFILE_PATH: &str = "users/me/";

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Shelter,
    Client,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Shelter => "shelter",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "shelter" => Ok(Self::Shelter),
            "client" => Ok(Self::Client),
            _ => Err(format!(
                "Unknown role: {value} (expected client, shelter or admin)"
            )),
        }
    }
}

/// The backend's representation of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
}

/// An authenticated identity with its credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access: String,
    pub refresh: String,
    pub user: UserProfile,
}

/// Authentication status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated,
    AuthenticationFailed { message: String },
}

impl AuthState {
    pub fn name(&self) -> &'static str {
        match self {
            AuthState::Anonymous => "anonymous",
            AuthState::Authenticating => "authenticating",
            AuthState::Authenticated => "authenticated",
            AuthState::AuthenticationFailed { .. } => "authentication_failed",
        }
    }
}

/// Role flags derived from the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthFlags {
    pub is_authenticated: bool,
    pub is_admin: bool,
    pub is_shelter: bool,
    pub is_client: bool,
}

impl AuthFlags {
    fn from_session(session: Option<&Session>) -> Self {
        let role = session.map(|s| s.user.role);
        Self {
            is_authenticated: session.is_some_and(|s| !s.access.is_empty()),
            is_admin: role == Some(Role::Admin),
            is_shelter: role == Some(Role::Shelter),
            is_client: role == Some(Role::Client),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenPair {
    access: String,
    refresh: String,
}

struct StoreState {
    session: Option<Session>,
    status: AuthState,
}

struct SessionInner {
    state: Mutex<StoreState>,
    storage: Arc<dyn SessionStorage>,
}

impl SessionInner {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scrub_storage(&self) {
        if let Err(e) = self.storage.remove_many(&keys::ALL) {
            tracing::warn!(error = %format!("{e:#}"), "failed to clear persisted session");
        }
    }

    /// Drops the session. The status only moves to anonymous when no login
    /// is in flight; an in-flight login decides its own outcome.
    fn clear_session(&self) {
        let mut state = self.lock();
        state.session = None;
        if state.status != AuthState::Authenticating {
            state.status = AuthState::Anonymous;
        }
        self.scrub_storage();
    }
}

impl UnauthorizedObserver for SessionInner {
    fn on_unauthorized(&self) {
        tracing::info!("credential rejected by backend; clearing session");
        self.clear_session();
    }
}

/// Owns the current session and its lifecycle.
///
/// Cheap to clone; clones observe the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
    client: ApiClient,
}

impl SessionStore {
    /// Creates a store bound to `client`, hydrating any persisted session
    /// from the client's storage and subscribing to its unauthorized signal.
    pub fn new(client: ApiClient) -> Self {
        let storage = Arc::clone(client.storage());
        let session = hydrate(storage.as_ref());
        let status = if session.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        };

        let inner = Arc::new(SessionInner {
            state: Mutex::new(StoreState { session, status }),
            storage,
        });
        let observer: Arc<dyn UnauthorizedObserver> = Arc::<SessionInner>::clone(&inner);
        client.signal().subscribe(&observer);

        Self { inner, client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn state(&self) -> AuthState {
        self.inner.lock().status.clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.lock().session.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.inner.lock().session.as_ref().map(|s| s.user.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.lock().session.as_ref().map(|s| s.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.lock().session.as_ref().map(|s| s.refresh.clone())
    }

    /// Flags computed from the session at the time of the call.
    pub fn flags(&self) -> AuthFlags {
        AuthFlags::from_session(self.inner.lock().session.as_ref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.flags().is_authenticated
    }

    pub fn is_admin(&self) -> bool {
        self.flags().is_admin
    }

    pub fn is_shelter(&self) -> bool {
        self.flags().is_shelter
    }

    pub fn is_client(&self) -> bool {
        self.flags().is_client
    }

    /// True while a login is in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.lock().status == AuthState::Authenticating
    }

    /// Message recorded by the last failed login.
    pub fn error(&self) -> Option<String> {
        match &self.inner.lock().status {
            AuthState::AuthenticationFailed { message } => Some(message.clone()),
            _ => None,
        }
    }

    /// Discards a recorded login failure.
    pub fn clear_error(&self) {
        let mut state = self.inner.lock();
        if matches!(state.status, AuthState::AuthenticationFailed { .. }) {
            state.status = AuthState::Anonymous;
        }
    }

    /// Exchanges credentials for a session.
    ///
    /// The trimmed username is tried as typed first; only a 401 on that
    /// attempt triggers a second one with the lower-cased username. Returns
    /// whether the store ended up authenticated; failures are recorded in
    /// [`SessionStore::error`].
    pub async fn login(&self, username: &str, password: &str) -> bool {
        self.inner.lock().status = AuthState::Authenticating;

        let username = username.trim();
        tracing::info!(username, "logging in");

        match self.authenticate(username, password).await {
            Ok(session) => {
                let role = session.user.role;
                {
                    // Storage and memory change under one lock so overlapping
                    // logins cannot leave them disagreeing.
                    let mut state = self.inner.lock();
                    self.persist(&session);
                    state.session = Some(session);
                    state.status = AuthState::Authenticated;
                }
                tracing::info!(%role, "login succeeded");
                true
            }
            Err(err) => {
                let message = login_error_message(&err);
                tracing::warn!(error = %err, "login failed");
                {
                    let mut state = self.inner.lock();
                    state.session = None;
                    state.status = AuthState::AuthenticationFailed { message };
                    self.inner.scrub_storage();
                }
                false
            }
        }
    }

    /// Clears the session and its persisted copy. Always succeeds.
    pub fn logout(&self) -> bool {
        let was_authenticated = self.is_authenticated();
        self.inner.clear_session();
        if was_authenticated {
            tracing::info!("logged out");
        }
        true
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let tokens = match self.exchange(username, password).await {
            Err(err) if err.is_unauthorized() => {
                let lowered = username.to_lowercase();
                tracing::debug!("credentials rejected; retrying with lower-cased username");
                self.exchange(&lowered, password).await?
            }
            other => other?,
        };

        let user = self
            .client
            .get_with(PROFILE_PATH, RequestConfig::bearer(&tokens.access)?)
            .await?
            .json::<UserProfile>()?;

        Ok(Session {
            access: tokens.access,
            refresh: tokens.refresh,
            user,
        })
    }

    async fn exchange(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        self.client
            .post(
                LOGIN_PATH,
                json!({ "username": username, "password": password }),
            )
            .await?
            .json::<TokenPair>()
    }

    fn persist(&self, session: &Session) {
        let result = serde_json::to_string(&session.user)
            .context("Failed to serialize user profile")
            .and_then(|user| {
                self.inner.storage.set_many(&[
                    (keys::ACCESS_TOKEN, session.access.as_str()),
                    (keys::REFRESH_TOKEN, session.refresh.as_str()),
                    (keys::USER, user.as_str()),
                ])
            });
        if let Err(e) = result {
            tracing::warn!(error = %format!("{e:#}"), "failed to persist session");
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state().name())
            .field("user", &self.user().map(|u| u.username))
            .finish_non_exhaustive()
    }
}

/// Picks the user-facing message for a failed login.
fn login_error_message(err: &ApiError) -> String {
    if let Some(detail) = err.detail().filter(|d| !d.trim().is_empty()) {
        return detail.to_string();
    }
    match (err.kind, err.status) {
        (ApiErrorKind::HttpStatus, Some(401)) => INVALID_CREDENTIALS_MESSAGE.to_string(),
        (ApiErrorKind::HttpStatus, Some(400)) => INVALID_DATA_MESSAGE.to_string(),
        (ApiErrorKind::Transport | ApiErrorKind::Timeout, _) => UNREACHABLE_MESSAGE.to_string(),
        _ => GENERIC_LOGIN_MESSAGE.to_string(),
    }
}

/// Restores a persisted session. Partial or unreadable records are scrubbed.
fn hydrate(storage: &dyn SessionStorage) -> Option<Session> {
    match read_persisted(storage) {
        Ok(Some(session)) => {
            tracing::debug!(username = %session.user.username, "restored persisted session");
            Some(session)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "discarding unusable persisted session");
            if let Err(e) = storage.remove_many(&keys::ALL) {
                tracing::warn!(error = %format!("{e:#}"), "failed to clear persisted session");
            }
            None
        }
    }
}

fn read_persisted(storage: &dyn SessionStorage) -> Result<Option<Session>> {
    let access = storage.get(keys::ACCESS_TOKEN)?.filter(|s| !s.is_empty());
    let refresh = storage.get(keys::REFRESH_TOKEN)?.filter(|s| !s.is_empty());
    let user = storage.get(keys::USER)?.filter(|s| !s.is_empty());

    match (access, refresh, user) {
        (None, None, None) => Ok(None),
        (Some(access), Some(refresh), Some(user)) => {
            let user: UserProfile =
                serde_json::from_str(&user).context("Failed to parse persisted user profile")?;
            Ok(Some(Session {
                access,
                refresh,
                user,
            }))
        }
        _ => anyhow::bail!("Persisted session is incomplete"),
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::storage::MemoryStorage;

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: 7,
            username: "maria".to_string(),
            email: "maria@example.com".to_string(),
            role,
            phone: None,
        }
    }

    fn store_with(storage: Arc<MemoryStorage>) -> SessionStore {
        let client = ApiClient::new(
            Url::parse("http://127.0.0.1:9/api/").unwrap(),
            storage,
            None,
        )
        .unwrap();
        SessionStore::new(client)
    }

    fn persist_all(storage: &MemoryStorage, role: Role) {
        let user = serde_json::to_string(&profile(role)).unwrap();
        storage
            .set_many(&[
                (keys::ACCESS_TOKEN, "A"),
                (keys::REFRESH_TOKEN, "R"),
                (keys::USER, &user),
            ])
            .unwrap();
    }

    #[test]
    fn test_flags_follow_role() {
        let session = Session {
            access: "A".to_string(),
            refresh: "R".to_string(),
            user: profile(Role::Shelter),
        };
        let flags = AuthFlags::from_session(Some(&session));
        assert!(flags.is_authenticated);
        assert!(flags.is_shelter);
        assert!(!flags.is_admin);
        assert!(!flags.is_client);

        assert_eq!(AuthFlags::from_session(None), AuthFlags::default());
    }

    #[test]
    fn test_new_store_without_persisted_session_is_anonymous() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        assert_eq!(store.state(), AuthState::Anonymous);
        assert!(!store.is_authenticated());
        assert_eq!(store.error(), None);
    }

    #[test]
    fn test_hydrates_complete_session() {
        let storage = Arc::new(MemoryStorage::new());
        persist_all(&storage, Role::Admin);

        let store = store_with(storage);
        assert_eq!(store.state(), AuthState::Authenticated);
        assert!(store.is_admin());
        assert_eq!(store.access_token().as_deref(), Some("A"));
        assert_eq!(store.refresh_token().as_deref(), Some("R"));
    }

    #[test]
    fn test_partial_session_is_scrubbed() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::ACCESS_TOKEN, "A").unwrap();

        let store = store_with(Arc::clone(&storage));
        assert_eq!(store.state(), AuthState::Anonymous);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_corrupt_profile_is_scrubbed() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_many(&[
                (keys::ACCESS_TOKEN, "A"),
                (keys::REFRESH_TOKEN, "R"),
                (keys::USER, "{\"id\": 1, \"role\": \"superuser\"}"),
            ])
            .unwrap();

        let store = store_with(Arc::clone(&storage));
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_logout_clears_memory_and_storage() {
        let storage = Arc::new(MemoryStorage::new());
        persist_all(&storage, Role::Client);
        let store = store_with(Arc::clone(&storage));
        assert!(store.is_client());

        assert!(store.logout());
        assert_eq!(store.state(), AuthState::Anonymous);
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());

        // Idempotent.
        assert!(store.logout());
        assert_eq!(store.state(), AuthState::Anonymous);
    }

    #[test]
    fn test_signal_logs_out() {
        let storage = Arc::new(MemoryStorage::new());
        persist_all(&storage, Role::Client);
        let store = store_with(Arc::clone(&storage));

        assert_eq!(store.client().signal().emit(), 1);
        assert_eq!(store.state(), AuthState::Anonymous);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_signal_during_login_keeps_status() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        store.inner.lock().status = AuthState::Authenticating;

        store.client().signal().emit();
        assert_eq!(store.state(), AuthState::Authenticating);
        assert!(store.is_loading());
    }

    #[test]
    fn test_clear_error_returns_to_anonymous() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        store.inner.lock().status = AuthState::AuthenticationFailed {
            message: INVALID_CREDENTIALS_MESSAGE.to_string(),
        };
        assert_eq!(store.error().as_deref(), Some(INVALID_CREDENTIALS_MESSAGE));

        store.clear_error();
        assert_eq!(store.state(), AuthState::Anonymous);
        assert_eq!(store.error(), None);
    }

    #[test]
    fn test_login_error_message_precedence() {
        let with_detail = ApiError::http_status(401, json!({"detail": "Account disabled"}));
        assert_eq!(login_error_message(&with_detail), "Account disabled");

        let bare_401 = ApiError::http_status(401, serde_json::Value::Null);
        assert_eq!(login_error_message(&bare_401), INVALID_CREDENTIALS_MESSAGE);

        let bare_400 = ApiError::http_status(400, json!({"username": ["required"]}));
        assert_eq!(login_error_message(&bare_400), INVALID_DATA_MESSAGE);

        let transport = ApiError::new(ApiErrorKind::Transport, "connection refused");
        assert_eq!(login_error_message(&transport), UNREACHABLE_MESSAGE);

        let server = ApiError::http_status(500, serde_json::Value::Null);
        assert_eq!(login_error_message(&server), GENERIC_LOGIN_MESSAGE);
    }

    #[test]
    fn test_dropping_store_unsubscribes() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        let client = store.client().clone();
        assert_eq!(client.signal().observer_count(), 1);
        drop(store);
        assert_eq!(client.signal().observer_count(), 0);
    }
}
