//! HTTP client wrapper for the TeAdopto REST API.
//!
//! Every request is resolved against the configured base URL, carries the
//! stored access token as a bearer credential, and decodes the body as JSON.
//! A 401 from the backend fires the [`UnauthorizedSignal`] before the error
//! is returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use crate::api::error::ApiError;
use crate::api::signal::UnauthorizedSignal;
use crate::config::Config;
use crate::storage::{SessionStorage, keys};

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("teadopto/", env!("CARGO_PKG_VERSION"));

/// Request payload.
pub enum RequestBody {
    /// Serialized as `application/json`
    Json(Value),
    /// Sent as `multipart/form-data`; the boundary header is set by the transport
    Form(Form),
}

impl RequestBody {
    /// Serializes any value into a JSON body.
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the value cannot be serialized.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::invalid_request(format!("failed to encode request body: {e}")))
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<Map<String, Value>> for RequestBody {
    fn from(map: Map<String, Value>) -> Self {
        RequestBody::Json(Value::Object(map))
    }
}

impl From<Form> for RequestBody {
    fn from(form: Form) -> Self {
        RequestBody::Form(form)
    }
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Json(_) => f.write_str("RequestBody::Json"),
            RequestBody::Form(_) => f.write_str("RequestBody::Form"),
        }
    }
}

/// Per-request overrides. Headers here win over the defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub headers: HeaderMap,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a header.
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the value is not a valid header value.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self, ApiError> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| ApiError::invalid_request(format!("invalid value for header {name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Overrides the bearer credential for this request only.
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the token contains invalid header characters.
    pub fn bearer(token: &str) -> Result<Self, ApiError> {
        Self::new().with_header(AUTHORIZATION, &format!("Bearer {token}"))
    }
}

/// Successful response with its decoded body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// JSON body; `Null` for empty bodies, `String` for non-JSON ones
    pub data: Value,
}

impl ApiResponse {
    /// Decodes the body into a typed value.
    ///
    /// # Errors
    /// Returns a `Decode` error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            ApiError::decode(self.status, format!("unexpected response shape: {e}"))
        })
    }
}

/// Shared client for the REST API.
///
/// Cheap to clone; clones share the connection pool, storage and signal.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    storage: Arc<dyn SessionStorage>,
    signal: UnauthorizedSignal,
    attach_credentials: bool,
    emits_unauthorized: bool,
}

impl ApiClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: Url,
        storage: Arc<dyn SessionStorage>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: with_trailing_slash(base_url),
            http,
            storage,
            signal: UnauthorizedSignal::new(),
            attach_credentials: true,
            emits_unauthorized: true,
        })
    }

    /// Creates a client from resolved configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(config: &Config, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        Self::new(config.api_base_url()?, storage, config.request_timeout())
    }

    /// A client for public endpoints: it sends no stored credential and
    /// never fires the unauthorized signal.
    pub fn anonymous(&self) -> Self {
        Self {
            attach_credentials: false,
            emits_unauthorized: false,
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    pub fn signal(&self) -> &UnauthorizedSignal {
        &self.signal
    }

    /// Sends a request and decodes the response.
    ///
    /// # Errors
    /// Returns an [`ApiError`] for non-2xx statuses, transport failures,
    /// timeouts, and requests that cannot be built.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint(path)?;

        let mut headers = HeaderMap::new();
        if self.attach_credentials
            && let Some(token) = self.stored_access_token()
        {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| {
                    ApiError::invalid_request(format!("stored access token is unusable: {e}"))
                })?;
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(config) = config {
            for (name, value) in &config.headers {
                headers.insert(name.clone(), value.clone());
            }
        }

        tracing::debug!(%method, %url, "api request");

        let mut builder = self.http.request(method.clone(), url);
        builder = match body {
            Some(RequestBody::Json(value)) => builder.headers(headers).json(&value),
            Some(RequestBody::Form(form)) => {
                headers.remove(CONTENT_TYPE);
                builder.headers(headers).multipart(form)
            }
            None => builder.headers(headers),
        };

        let response = builder.send().await.map_err(|e| {
            tracing::debug!(%method, path, error = %e, "api request failed without a response");
            ApiError::transport(&e)
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::decode(status, format!("failed to read response body: {e}")))?;
        let data = parse_body(&text);

        if !(200..300).contains(&status) {
            let err = ApiError::http_status(status, data);
            if err.is_unauthorized() && self.emits_unauthorized {
                tracing::warn!(%method, path, "backend rejected credentials");
                self.signal.emit();
            }
            return Err(err);
        }

        Ok(ApiResponse { status, data })
    }

    /// # Errors
    /// See [`ApiClient::request`].
    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::GET, path, None, None).await
    }

    /// GET with per-request overrides.
    ///
    /// # Errors
    /// See [`ApiClient::request`].
    pub async fn get_with(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::GET, path, None, Some(config)).await
    }

    /// # Errors
    /// See [`ApiClient::request`].
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::POST, path, Some(body.into()), None)
            .await
    }

    /// # Errors
    /// See [`ApiClient::request`].
    pub async fn patch(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::PATCH, path, Some(body.into()), None)
            .await
    }

    /// # Errors
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::DELETE, path, None, None).await
    }

    /// Resolves a relative endpoint path under the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let relative = path.trim_start_matches('/');
        self.base_url
            .join(relative)
            .map_err(|e| ApiError::invalid_request(format!("invalid endpoint path {path:?}: {e}")))
    }

    fn stored_access_token(&self) -> Option<String> {
        match self.storage.get(keys::ACCESS_TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "failed to read stored access token");
                None
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("attach_credentials", &self.attach_credentials)
            .field("emits_unauthorized", &self.emits_unauthorized)
            .finish_non_exhaustive()
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStorage;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(
            Url::parse(base).unwrap(),
            Arc::new(MemoryStorage::new()),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let client = client("http://127.0.0.1:8000/api");
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8000/api/");
        assert_eq!(
            client.endpoint("pets/").unwrap().as_str(),
            "http://127.0.0.1:8000/api/pets/"
        );
        // Leading slash must not escape the API prefix.
        assert_eq!(
            client.endpoint("/users/me/").unwrap().as_str(),
            "http://127.0.0.1:8000/api/users/me/"
        );
        assert_eq!(
            client.endpoint("pets/?page=2").unwrap().as_str(),
            "http://127.0.0.1:8000/api/pets/?page=2"
        );
    }

    #[test]
    fn test_parse_body_shapes() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("  \n"), Value::Null);
        assert_eq!(parse_body(r#"{"count": 3}"#), json!({"count": 3}));
        assert_eq!(
            parse_body("<h1>Server Error</h1>"),
            Value::String("<h1>Server Error</h1>".to_string())
        );
    }

    #[test]
    fn test_anonymous_client_shares_signal_but_stays_silent() {
        let client = client("http://127.0.0.1:8000/api/");
        let anon = client.anonymous();
        assert!(!anon.attach_credentials);
        assert!(!anon.emits_unauthorized);
        assert!(client.attach_credentials);
        assert_eq!(anon.base_url(), client.base_url());
    }

    #[test]
    fn test_stored_token_blank_is_ignored() {
        let client = client("http://127.0.0.1:8000/api/");
        client.storage().set(keys::ACCESS_TOKEN, "").unwrap();
        assert_eq!(client.stored_access_token(), None);

        client.storage().set(keys::ACCESS_TOKEN, "abc").unwrap();
        assert_eq!(client.stored_access_token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_request_config_bearer() {
        let config = RequestConfig::bearer("T1").unwrap();
        assert_eq!(config.headers.get(AUTHORIZATION).unwrap(), "Bearer T1");
        assert!(RequestConfig::bearer("bad\ntoken").is_err());
    }

    #[test]
    fn test_response_json_decode_error() {
        let response = ApiResponse {
            status: 200,
            data: json!({"unexpected": true}),
        };
        let err = response.json::<Vec<u64>>().unwrap_err();
        assert_eq!(err.kind, crate::api::ApiErrorKind::Decode);
        assert_eq!(err.status(), Some(200));
    }
}
