//! API response descriptor.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::auth::AuthError;

/// A response as received from the transport, before error mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers (lowercase names).
    pub headers: BTreeMap<String, String>,
    /// Raw body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response.
    #[must_use]
    pub const fn new(status: u16, headers: BTreeMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Creates a response with a JSON body.
    #[must_use]
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self::new(status, headers, value.to_string().into_bytes())
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true for 401.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Body as UTF-8 text (lossy).
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the JSON body.
    ///
    /// # Errors
    /// Returns `AuthError::InvalidResponse` if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AuthError> {
        serde_json::from_slice(&self.body).map_err(|e| AuthError::InvalidResponse {
            message: e.to_string(),
        })
    }

    /// Best-effort error text: the `message` or `error` field of a JSON
    /// body, otherwise the raw body.
    #[must_use]
    pub fn error_message(&self) -> String {
        serde_json::from_slice::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .or_else(|| value.get("error"))
                    .and_then(|m| m.as_str().map(str::to_string))
            })
            .unwrap_or_else(|| self.text())
    }

    /// Converts a non-success response into the matching error.
    ///
    /// # Errors
    /// Returns `AuthError::Unauthorized` for 401 and `AuthError::Endpoint` for
    /// any other non-2xx status.
    pub fn error_for_status(self) -> Result<Self, AuthError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AuthError::from_status(self.status, self.error_message()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_json_field() {
        let response = ApiResponse::json_body(422, &json!({"message": "email taken"}));
        assert_eq!(response.error_message(), "email taken");

        let plain = ApiResponse::new(500, BTreeMap::new(), b"boom".to_vec());
        assert_eq!(plain.error_message(), "boom");
    }

    #[test]
    fn test_error_for_status() {
        let ok = ApiResponse::json_body(200, &json!({"id": 1}));
        assert!(ok.error_for_status().is_ok());

        let unauthorized = ApiResponse::json_body(401, &json!({"error": "expired"}));
        let err = unauthorized.error_for_status().unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_json_decoding() {
        let response = ApiResponse::json_body(200, &json!({"id": 7}));
        let value: serde_json::Value = response.json().expect("valid json");
        assert_eq!(value["id"], 7);

        let broken = ApiResponse::new(200, BTreeMap::new(), b"{".to_vec());
        assert!(matches!(
            broken.json::<serde_json::Value>(),
            Err(AuthError::InvalidResponse { .. })
        ));
    }
}
