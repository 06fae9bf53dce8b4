//! Outgoing API request descriptor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::HttpMethod;

/// Header carrying the bearer credential.
pub const AUTHORIZATION: &str = "Authorization";

/// Anything that can carry an access token.
///
/// Requests parked while a refresh is running are replayed through this
/// trait once the new token is known.
pub trait Authorize: Sized {
    /// Returns the request with `access_token` attached.
    #[must_use]
    fn authorize(self, access_token: &str) -> Self;
}

/// Per-request switches for the authenticated client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Send without credentials and without token refresh.
    #[serde(default)]
    pub skip_auth: bool,
    /// Return non-success responses as-is instead of mapping them to errors.
    #[serde(default)]
    pub skip_error_handling: bool,
    /// Set once the request has been replayed after a 401.
    #[serde(default)]
    pub retried: bool,
}

/// A request against the backend API, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the base URL, e.g. `/projects`.
    pub path: String,
    /// Extra headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON body.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    /// Client behaviour switches.
    #[serde(default)]
    pub options: RequestOptions,
}

impl ApiRequest {
    /// Creates a request without a body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    /// GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// POST request with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    /// DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Marks the request as public: no token, no refresh.
    #[must_use]
    pub const fn skip_auth(mut self) -> Self {
        self.options.skip_auth = true;
        self
    }

    /// Returns non-success responses instead of errors.
    #[must_use]
    pub const fn skip_error_handling(mut self) -> Self {
        self.options.skip_error_handling = true;
        self
    }

    /// The bearer token currently attached, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.strip_prefix("Bearer "))
    }
}

impl Authorize for ApiRequest {
    fn authorize(mut self, access_token: &str) -> Self {
        self.headers
            .insert(AUTHORIZATION.to_string(), format!("Bearer {access_token}"));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_authorize_replaces_previous_token() {
        let request = ApiRequest::get("/projects").authorize("old").authorize("new");
        assert_eq!(request.bearer_token(), Some("new"));
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_builder_flags() {
        let request = ApiRequest::post("/auth/refresh", serde_json::json!({"refreshToken": "r"}))
            .skip_auth()
            .skip_error_handling()
            .with_header("X-Trace", "1");
        assert!(request.options.skip_auth);
        assert!(request.options.skip_error_handling);
        assert!(!request.options.retried);
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.headers.get("X-Trace").map(String::as_str), Some("1"));
        assert_eq!(request.bearer_token(), None);
    }
}
