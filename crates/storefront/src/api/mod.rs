//! HTTP transport to the Boutique backend.
//!
//! Every backend call goes through [`ApiClient`], which:
//! - joins API paths onto the configured base URL
//! - injects `Authorization: Bearer <token>` when the token store holds one
//! - turns non-success responses into [`ApiError::Status`] with the most
//!   useful message the body offers (`detail`, `message`, `error`, raw text)
//!
//! Nothing here retries. Callers decide what a failure means.

mod timestamp;
pub mod types;

pub use types::*;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::auth::{AuthError, TokenStore};
use crate::config::StorefrontConfig;

/// Longest slice of an error body kept in logs.
const LOG_BODY_LIMIT: usize = 500;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        status: StatusCode,
        message: String,
    },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status of a backend rejection, if that is what this is.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the bearer token (HTTP 401).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Whether the backend refused the call for lack of admin rights.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(StatusCode::FORBIDDEN)
    }
}

/// Client for the Boutique REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and token store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
}

impl ApiClient {
    /// Create a new API client reading bearer tokens from `tokens`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.api_base.clone(),
                tokens,
            }),
        })
    }

    /// Get the backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Get the token store used for bearer authentication.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Fail with `AuthError::Unauthenticated` when no token is stored, so
    /// protected calls never reach the network anonymously.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` if the token store is empty.
    pub fn require_token(&self) -> Result<(), AuthError> {
        if self.inner.tokens.is_present() {
            Ok(())
        } else {
            Err(AuthError::Unauthenticated)
        }
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` if the request fails, the backend rejects it,
    /// or the body does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::GET, path)?).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::POST, path)?.json(body))
            .await
    }

    /// `POST` without a body.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::POST, path)?).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::PUT, path)?.json(body))
            .await
    }

    /// `DELETE` a resource.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::DELETE, path)?).await
    }

    /// Resolve an API path (e.g. `/cart/add`) against the base URL.
    ///
    /// The base URL's own path is kept as a prefix, so a backend mounted at
    /// `https://host/api` serves `/cart` from `https://host/api/cart`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Url` if the result is not a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        let mut request = self.inner.client.request(method, url);
        if let Some(token) = self.inner.tokens.get() {
            request = request.bearer_auth(token.expose_secret());
        }
        Ok(request)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(
                status = %status,
                url = %url,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status,
                message: error_message(status, &body),
            });
        }

        // Some mutations answer with an empty body.
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}

/// Pick the most descriptive message out of an error response body.
///
/// Tries `detail`, then `message`, then `error` on a JSON object (FastAPI
/// validation errors put a list under `detail`), then a bare JSON string,
/// then the raw text, then the status line.
fn error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {}", status.as_u16());
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => ["detail", "message", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(describe_value))
            .unwrap_or_else(|| format!("HTTP {}: {body}", status.as_u16())),
        Ok(serde_json::Value::String(text)) => text,
        _ => body.to_string(),
    }
}

fn describe_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) if !text.is_empty() => Some(text.clone()),
        serde_json::Value::Array(entries) if !entries.is_empty() => Some(
            entries
                .iter()
                .map(|entry| {
                    entry
                        .get("msg")
                        .and_then(serde_json::Value::as_str)
                        .map_or_else(|| entry.to_string(), str::to_string)
                })
                .collect::<Vec<_>>()
                .join("; "),
        ),
        serde_json::Value::Null | serde_json::Value::String(_) | serde_json::Value::Array(_) => {
            None
        }
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn client(base: &str) -> ApiClient {
        let config = StorefrontConfig::new(Url::parse(base).unwrap());
        ApiClient::new(&config, TokenStore::new(MemoryStore::shared())).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("https://shop.example.com/api/");
        assert_eq!(
            api.endpoint("/cart/add").unwrap().as_str(),
            "https://shop.example.com/api/cart/add"
        );

        let api = client("http://localhost:8000");
        assert_eq!(
            api.endpoint("orders/o-1/pay").unwrap().as_str(),
            "http://localhost:8000/orders/o-1/pay"
        );
    }

    #[test]
    fn test_error_message_prefers_detail() {
        let msg = error_message(
            StatusCode::UNAUTHORIZED,
            r#"{"detail": "Email ou mot de passe incorrect", "message": "other"}"#,
        );
        assert_eq!(msg, "Email ou mot de passe incorrect");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message": "Stock insuffisant"}"#),
            "Stock insuffisant"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error": "nope"}"#),
            "nope"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"code": 7}"#),
            r#"HTTP 400: {"code": 7}"#
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(error_message(StatusCode::INTERNAL_SERVER_ERROR, ""), "HTTP 500");
        assert_eq!(error_message(StatusCode::NOT_FOUND, r#""gone""#), "gone");
    }

    #[test]
    fn test_error_message_validation_list() {
        let body = r#"{"detail": [{"loc": ["body", "qty"], "msg": "must be >= 1"}, {"msg": "bad id"}]}"#;
        assert_eq!(
            error_message(StatusCode::UNPROCESSABLE_ENTITY, body),
            "must be >= 1; bad id"
        );
    }

    #[test]
    fn test_api_error_status_helpers() {
        let err = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: "expired".to_string(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "HTTP 401 Unauthorized: expired");
    }
}
