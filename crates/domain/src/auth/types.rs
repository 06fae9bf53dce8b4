//! Authentication domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::error::{DomainError, DomainResult};

/// Login credentials sent to the authentication endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from an email and password.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Checks that both fields are present.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidCredentials` if either field is blank.
    pub fn validate(&self) -> DomainResult<()> {
        if self.email.trim().is_empty() {
            return Err(DomainError::InvalidCredentials("email is required".into()));
        }
        if self.password.is_empty() {
            return Err(DomainError::InvalidCredentials(
                "password is required".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The authenticated user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend identifier.
    pub id: String,
    /// Account email.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    /// Name to show in status lines, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Token pair issued by the login and refresh endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    /// Short-lived credential attached to every request.
    pub access_token: String,
    /// Long-lived credential used only to obtain new access tokens.
    pub refresh_token: String,
    /// Lifetime of the access token in seconds, if the server reports it.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Body returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The user that logged in.
    pub user: User,
    /// The issued tokens.
    #[serde(flatten)]
    pub tokens: TokenPayload,
}

/// Snapshot of everything the token store persists.
///
/// A record only exists when both tokens are present; the store never
/// exposes half a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Decoded access token.
    pub access_token: String,
    /// Decoded refresh token.
    pub refresh_token: String,
    /// Absolute expiry in epoch milliseconds.
    pub expires_at_ms: Option<i64>,
    /// Last user activity in epoch milliseconds.
    pub last_activity_ms: Option<i64>,
}

impl TokenRecord {
    /// Returns true once `now_ms` has reached the refresh window
    /// (`expires_at - buffer`). A missing expiry counts as expired.
    #[must_use]
    pub fn is_expiring(&self, now_ms: i64, buffer_ms: i64) -> bool {
        expiry_reached(self.expires_at_ms, now_ms, buffer_ms)
    }

    /// Milliseconds until the access token expires, or None if unknown.
    #[must_use]
    pub fn millis_until_expiry(&self, now_ms: i64) -> Option<i64> {
        self.expires_at_ms.map(|exp| exp - now_ms)
    }
}

/// Shared expiry rule: `now >= expires_at - buffer`, fail-closed on `None`.
#[must_use]
pub fn expiry_reached(expires_at_ms: Option<i64>, now_ms: i64, buffer_ms: i64) -> bool {
    expires_at_ms.is_none_or(|exp| now_ms >= exp.saturating_sub(buffer_ms))
}

/// Returns a log-safe preview of a token (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    match token.char_indices().nth(8) {
        Some((idx, _)) if token.len() > 12 => format!("{}...", &token[..idx]),
        _ => "***".to_string(),
    }
}

/// Authentication and request errors.
///
/// Cloneable so a single refresh failure can be delivered to every
/// request that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No usable session exists.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The server rejected the credentials or token (HTTP 401).
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Server-provided reason.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("endpoint returned HTTP {status}: {message}")]
    Endpoint {
        /// HTTP status code.
        status: u16,
        /// Server-provided reason.
        message: String,
    },

    /// The request could not reach the server.
    #[error("network error: {message}")]
    Network {
        /// Error description.
        message: String,
    },

    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The response body could not be understood.
    #[error("invalid response: {message}")]
    InvalidResponse {
        /// Error description.
        message: String,
    },

    /// Persisting tokens failed.
    #[error("token storage error: {message}")]
    Storage {
        /// Error description.
        message: String,
    },

    /// The refresh task ended without producing a result.
    #[error("token refresh was interrupted")]
    RefreshInterrupted,

    /// The request queue was cleared while the request was waiting.
    #[error("request queue cleared")]
    QueueCleared,
}

impl AuthError {
    /// Maps a non-success HTTP status to the matching variant.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 401 {
            Self::Unauthorized { message }
        } else {
            Self::Endpoint { status, message }
        }
    }

    /// Returns true for 401-class failures, which end the session.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
