//! Session layer settings.
//!
//! Every field has a serde default so partial config files and
//! environment overrides deserialize cleanly.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend endpoints used by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL every path is joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Authentication endpoint.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Refresh endpoint.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Logout endpoint.
    #[serde(default = "default_logout_path")]
    pub logout_path: String,

    /// Current-user endpoint.
    #[serde(default = "default_current_user_path")]
    pub current_user_path: String,

    /// Timeout applied to ordinary requests.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_refresh_path() -> String {
    "/auth/refresh".to_string()
}

fn default_logout_path() -> String {
    "/auth/logout".to_string()
}

fn default_current_user_path() -> String {
    "/auth/me".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl ApiSettings {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            refresh_path: default_refresh_path(),
            logout_path: default_logout_path(),
            current_user_path: default_current_user_path(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Token lifecycle settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Refresh this many seconds before the access token expires.
    #[serde(default = "default_refresh_buffer_secs")]
    pub refresh_buffer_secs: u64,

    /// Expiry horizon used when the server omits `expiresIn`.
    #[serde(default = "default_expires_in_secs")]
    pub default_expires_in_secs: u64,

    /// Upper bound for a refresh call.
    #[serde(default = "default_refresh_timeout_secs")]
    pub refresh_timeout_secs: u64,

    /// Idle time after which the session is considered abandoned.
    #[serde(default = "default_idle_timeout_minutes")]
    pub idle_timeout_minutes: u64,

    /// How often the current user is re-fetched while logged in.
    #[serde(default = "default_user_poll_interval_secs")]
    pub user_poll_interval_secs: u64,

    /// Prefix for the persisted storage keys.
    #[serde(default = "default_storage_key_prefix")]
    pub storage_key_prefix: String,
}

const fn default_refresh_buffer_secs() -> u64 {
    60
}

const fn default_expires_in_secs() -> u64 {
    3600
}

const fn default_refresh_timeout_secs() -> u64 {
    10
}

const fn default_idle_timeout_minutes() -> u64 {
    30
}

const fn default_user_poll_interval_secs() -> u64 {
    300
}

fn default_storage_key_prefix() -> String {
    "sea".to_string()
}

impl AuthSettings {
    /// Refresh safety margin.
    #[must_use]
    pub const fn refresh_buffer(&self) -> Duration {
        Duration::from_secs(self.refresh_buffer_secs)
    }

    /// Refresh call timeout.
    #[must_use]
    pub const fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    /// Idle logout threshold.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_minutes * 60)
    }

    /// Current-user polling period.
    #[must_use]
    pub const fn user_poll_interval(&self) -> Duration {
        Duration::from_secs(self.user_poll_interval_secs)
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            refresh_buffer_secs: default_refresh_buffer_secs(),
            default_expires_in_secs: default_expires_in_secs(),
            refresh_timeout_secs: default_refresh_timeout_secs(),
            idle_timeout_minutes: default_idle_timeout_minutes(),
            user_poll_interval_secs: default_user_poll_interval_secs(),
            storage_key_prefix: default_storage_key_prefix(),
        }
    }
}

/// Toast presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Display time for success, warning and info toasts.
    #[serde(default = "default_toast_duration_ms")]
    pub default_toast_duration_ms: u64,

    /// Display time for error toasts.
    #[serde(default = "default_error_toast_duration_ms")]
    pub error_toast_duration_ms: u64,

    /// How many toasts are rendered at once.
    #[serde(default = "default_max_visible_toasts")]
    pub max_visible_toasts: usize,
}

const fn default_toast_duration_ms() -> u64 {
    5000
}

const fn default_error_toast_duration_ms() -> u64 {
    7000
}

const fn default_max_visible_toasts() -> usize {
    5
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            default_toast_duration_ms: default_toast_duration_ms(),
            error_toast_duration_ms: default_error_toast_duration_ms(),
            max_visible_toasts: default_max_visible_toasts(),
        }
    }
}

/// All settings of the session layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeaSettings {
    /// Backend endpoints.
    #[serde(default)]
    pub api: ApiSettings,

    /// Token lifecycle.
    #[serde(default)]
    pub auth: AuthSettings,

    /// Toasts.
    #[serde(default)]
    pub notifications: NotificationSettings,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_settings() {
        let settings = SeaSettings::default();
        assert_eq!(settings.auth.refresh_buffer(), Duration::from_secs(60));
        assert_eq!(settings.auth.refresh_timeout(), Duration::from_secs(10));
        assert_eq!(settings.auth.idle_timeout(), Duration::from_secs(1800));
        assert_eq!(settings.auth.user_poll_interval(), Duration::from_secs(300));
        assert_eq!(settings.notifications.error_toast_duration_ms, 7000);
        assert_eq!(settings.notifications.max_visible_toasts, 5);
        assert_eq!(settings.api.login_path, "/auth/login");
    }

    #[test]
    fn partial_json_uses_defaults() {
        let settings: SeaSettings =
            serde_json::from_str(r#"{"auth": {"refresh_timeout_secs": 3}}"#).expect("valid json");
        assert_eq!(settings.auth.refresh_timeout_secs, 3);
        assert_eq!(settings.auth.refresh_buffer_secs, 60);
        assert_eq!(settings.api, ApiSettings::default());
    }
}
