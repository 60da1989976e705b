//! HTTP gateway to the tutoring backend.
//!
//! One `reqwest::Client` per `ApiClient`. Every request attaches the stored
//! access token as a bearer header when one exists; sending without a token
//! is not an error at this layer. There is no retry, no backoff, and no
//! special handling of 401 — validity is decided by the backend alone.

use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::auth::TokenStore;

/// Shown whenever the backend gives us nothing human-readable to work with.
pub const GENERIC_CONNECTION_ERROR: &str = "Impossible de se connecter au serveur";

/// Failure taxonomy for backend calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response reached us at all.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend responded with a non-2xx status.
    #[error("api error (HTTP {status})")]
    Api { status: StatusCode, body: Value },

    /// Client-side form check; never reached the network.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Extracts a human-readable message from an error.
///
/// Prefers the backend body's `detail` field, then the first field-level
/// message, then the generic connection-failure fallback.
pub fn detail_message(err: &ApiError) -> String {
    match err {
        ApiError::Validation(msg) => msg.clone(),
        ApiError::Network(_) => GENERIC_CONNECTION_ERROR.to_string(),
        ApiError::Api { body, .. } => body_message(body),
    }
}

fn body_message(body: &Value) -> String {
    if let Some(detail) = body.get("detail").and_then(Value::as_str) {
        return detail.to_string();
    }

    // Registration errors come back field-keyed, each value either a string
    // or a list of strings.
    if let Some(map) = body.as_object() {
        for value in map.values() {
            match value {
                Value::String(s) if !s.is_empty() => return s.clone(),
                Value::Array(items) => {
                    if let Some(first) = items.iter().find_map(Value::as_str) {
                        return first.to_string();
                    }
                }
                _ => {}
            }
        }
    }

    GENERIC_CONNECTION_ERROR.to_string()
}

/// HTTP client for the backend API.
pub struct ApiClient {
    base_url: String,
    tokens: TokenStore,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a client against the given base URL (must end with `/`).
    ///
    /// # Panics
    /// - In test builds (`#[cfg(test)]`), panics if `base_url` is not a
    ///   loopback address.
    /// - At runtime, panics if `TUTO_BLOCK_REAL_API=1` and `base_url` is not
    ///   a loopback address.
    ///
    /// This prevents tests from accidentally hitting a real backend; point
    /// them at a mock server instead.
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Self {
        let base_url = base_url.into();

        #[cfg(test)]
        assert!(
            is_loopback_url(&base_url),
            "Tests must not use a real backend! Found base_url: {base_url}"
        );

        #[cfg(not(test))]
        if std::env::var("TUTO_BLOCK_REAL_API").is_ok_and(|v| v == "1") {
            assert!(
                is_loopback_url(&base_url),
                "TUTO_BLOCK_REAL_API=1 but base_url is not local: {base_url}"
            );
        }

        Self {
            base_url,
            tokens,
            http: reqwest::Client::new(),
        }
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a JSON endpoint, attaching the stored token when present.
    ///
    /// # Errors
    /// `ApiError::Network` on transport failure, `ApiError::Api` on non-2xx.
    pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let token = self.stored_access_token();
        self.request(Method::GET, path, None, token.as_deref()).await
    }

    /// GET a JSON endpoint with an explicitly supplied access token.
    ///
    /// Used when the caller just obtained a token and must not re-read the
    /// store within the same logical operation.
    ///
    /// # Errors
    /// `ApiError::Network` on transport failure, `ApiError::Api` on non-2xx.
    pub async fn get_json_with_token(&self, path: &str, token: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None, Some(token)).await
    }

    /// POST a JSON body, attaching the stored token when present.
    ///
    /// # Errors
    /// `ApiError::Network` on transport failure, `ApiError::Api` on non-2xx.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let token = self.stored_access_token();
        self.request(Method::POST, path, Some(body), token.as_deref())
            .await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let mut builder = self.http.request(method, &url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.json().await.unwrap_or(Value::Null);
            tracing::debug!(%status, url, "request rejected");
            return Err(ApiError::Api { status, body });
        }

        // Some endpoints (registration) return 2xx with no body.
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    fn stored_access_token(&self) -> Option<String> {
        self.tokens.load().map(|pair| pair.access)
    }
}

fn is_loopback_url(base_url: &str) -> bool {
    let Ok(url) = Url::parse(base_url) else {
        return false;
    };
    matches!(
        url.host_str(),
        Some("localhost" | "127.0.0.1" | "10.0.2.2" | "[::1]" | "::1")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Test: `detail` field wins.
    #[test]
    fn test_detail_message_prefers_detail() {
        let err = ApiError::Api {
            status: StatusCode::UNAUTHORIZED,
            body: json!({"detail": "Identifiants invalides"}),
        };
        assert_eq!(detail_message(&err), "Identifiants invalides");
    }

    /// Test: field-level registration errors surface their first message.
    #[test]
    fn test_detail_message_field_errors() {
        let err = ApiError::Api {
            status: StatusCode::BAD_REQUEST,
            body: json!({"username": ["Ce nom d'utilisateur existe déjà."]}),
        };
        assert_eq!(detail_message(&err), "Ce nom d'utilisateur existe déjà.");
    }

    /// Test: empty or null bodies fall back to the generic message.
    #[test]
    fn test_detail_message_fallback() {
        let err = ApiError::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: Value::Null,
        };
        assert_eq!(detail_message(&err), GENERIC_CONNECTION_ERROR);
    }

    /// Test: validation errors pass through verbatim.
    #[test]
    fn test_detail_message_validation() {
        let err = ApiError::Validation("Le mot de passe est requis".to_string());
        assert_eq!(detail_message(&err), "Le mot de passe est requis");
    }

    /// Test: loopback detection for the test guard.
    #[test]
    fn test_is_loopback_url() {
        assert!(is_loopback_url("http://127.0.0.1:8000/api/"));
        assert!(is_loopback_url("http://localhost:3000/api/"));
        assert!(is_loopback_url("http://10.0.2.2:8000/api/"));
        assert!(!is_loopback_url("https://api.example.com/api/"));
        assert!(!is_loopback_url("not a url"));
    }
}
