//! Persistent token storage with expiry tracking.
//!
//! Tokens are encoded through a [`TokenCodec`] and written to a
//! [`KeyValueStorage`] together with their absolute expiry and the last
//! user activity. Every read is fail-closed: a value that cannot be decoded
//! or parsed clears all four fields and is reported as absent.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sea_domain::{AuthSettings, TokenRecord, expiry_reached};

use crate::ports::{Clock, KeyValueStorage, StorageError, TokenCodec};

#[derive(Debug)]
struct StorageKeys {
    access_token: String,
    refresh_token: String,
    token_expiry: String,
    last_activity: String,
}

impl StorageKeys {
    fn new(prefix: &str) -> Self {
        Self {
            access_token: format!("{prefix}.access_token"),
            refresh_token: format!("{prefix}.refresh_token"),
            token_expiry: format!("{prefix}.token_expiry"),
            last_activity: format!("{prefix}.last_activity"),
        }
    }

    fn all(&self) -> [&str; 4] {
        [
            &self.access_token,
            &self.refresh_token,
            &self.token_expiry,
            &self.last_activity,
        ]
    }
}

/// Token store shared by the request pipeline and the session controller.
///
/// Cloning is cheap; all clones operate on the same backend.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    codec: Arc<dyn TokenCodec>,
    clock: Arc<dyn Clock>,
    keys: Arc<StorageKeys>,
    /// Serialises writes so conditional updates see a stable pair.
    writes: Arc<Mutex<()>>,
    /// Milliseconds before expiry at which a token counts as expired.
    refresh_buffer_ms: i64,
    default_expires_in_secs: u64,
}

impl TokenStore {
    /// Creates a store over the given backend.
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        codec: Arc<dyn TokenCodec>,
        clock: Arc<dyn Clock>,
        settings: &AuthSettings,
    ) -> Self {
        Self {
            storage,
            codec,
            clock,
            keys: Arc::new(StorageKeys::new(&settings.storage_key_prefix)),
            writes: Arc::new(Mutex::new(())),
            refresh_buffer_ms: duration_millis(settings.refresh_buffer()),
            default_expires_in_secs: settings.default_expires_in_secs,
        }
    }

    /// Returns the decoded access token, or `None` if absent or corrupt.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read_token(&self.keys.access_token)
    }

    /// Returns the decoded refresh token, or `None` if absent or corrupt.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.read_token(&self.keys.refresh_token)
    }

    /// Persists both tokens, the computed expiry and a fresh activity stamp
    /// as one batch.
    ///
    /// When `expires_in_secs` is `None` the configured default lifetime is
    /// used.
    ///
    /// # Errors
    /// Returns the backend error if the batch cannot be written. The store
    /// is cleared in that case, so no half-written pair survives.
    pub fn set_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
        expires_in_secs: Option<u64>,
    ) -> Result<(), StorageError> {
        let _writes = self.writes.lock();
        self.write_pair(access_token, refresh_token, expires_in_secs)
    }

    /// Like [`set_tokens`](Self::set_tokens), but only while the stored
    /// refresh token is still `expected_refresh`.
    ///
    /// Returns `Ok(false)` without writing if the pair was replaced or
    /// cleared in the meantime.
    ///
    /// # Errors
    /// Same as [`set_tokens`](Self::set_tokens).
    pub fn replace_tokens(
        &self,
        expected_refresh: &str,
        access_token: &str,
        refresh_token: &str,
        expires_in_secs: Option<u64>,
    ) -> Result<bool, StorageError> {
        let _writes = self.writes.lock();
        if !self.holds_refresh_token(expected_refresh) {
            return Ok(false);
        }
        self.write_pair(access_token, refresh_token, expires_in_secs)?;
        Ok(true)
    }

    /// Clears all four persisted fields. Idempotent.
    pub fn remove_tokens(&self) {
        let _writes = self.writes.lock();
        self.clear();
    }

    /// Clears the store only while the stored refresh token is still
    /// `expected_refresh`. Returns whether it did.
    pub fn remove_tokens_if(&self, expected_refresh: &str) -> bool {
        let _writes = self.writes.lock();
        if !self.holds_refresh_token(expected_refresh) {
            return false;
        }
        self.clear();
        true
    }

    /// Returns true if no expiry is recorded or the refresh window
    /// (`expiry - buffer`) has been reached.
    #[must_use]
    pub fn is_token_expired(&self) -> bool {
        expiry_reached(self.expires_at(), self.clock.now_millis(), self.refresh_buffer_ms)
    }

    /// Returns true if no activity is recorded or more than `timeout` has
    /// passed since the last one.
    #[must_use]
    pub fn is_session_expired(&self, timeout: Duration) -> bool {
        self.read_millis(&self.keys.last_activity)
            .is_none_or(|last| self.clock.now_millis().saturating_sub(last) > duration_millis(timeout))
    }

    /// Stamps the current time as the last user activity.
    pub fn update_last_activity(&self) {
        let now = self.clock.now_millis().to_string();
        if let Err(error) = self.storage.set(&self.keys.last_activity, &now) {
            tracing::warn!(error = %error, "Failed to record activity");
        }
    }

    /// Absolute expiry of the access token in epoch milliseconds.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.read_millis(&self.keys.token_expiry)
    }

    /// Reads all fields as one snapshot.
    ///
    /// Returns `None` unless both tokens are present and decodable. A lone
    /// token without its partner is treated as corruption.
    #[must_use]
    pub fn record(&self) -> Option<TokenRecord> {
        let values = match self.storage.get_many(&self.keys.all()) {
            Ok(values) => values,
            Err(error) => {
                self.fail_closed(&error.to_string());
                return None;
            }
        };
        let [access, refresh, expiry, activity]: [Option<String>; 4] =
            values.try_into().ok()?;

        let (access, refresh) = match (access, refresh) {
            (Some(access), Some(refresh)) => (access, refresh),
            (None, None) => return None,
            _ => {
                self.fail_closed("token pair is incomplete");
                return None;
            }
        };

        let decoded = self
            .codec
            .decode(&access)
            .and_then(|access| Ok((access, self.codec.decode(&refresh)?)));
        let (access_token, refresh_token) = match decoded {
            Ok(pair) => pair,
            Err(error) => {
                self.fail_closed(&error.to_string());
                return None;
            }
        };

        Some(TokenRecord {
            access_token,
            refresh_token,
            expires_at_ms: self.parse_millis(expiry)?,
            last_activity_ms: self.parse_millis(activity)?,
        })
    }

    /// Summarises the stored token for status lines.
    #[must_use]
    pub fn status(&self) -> TokenStatus {
        let Some(record) = self.record() else {
            return TokenStatus::NotAuthenticated;
        };
        let now = self.clock.now_millis();
        match record.millis_until_expiry(now) {
            Some(remaining) if remaining > 0 => {
                let seconds_remaining = remaining / 1000;
                if record.is_expiring(now, self.refresh_buffer_ms) {
                    TokenStatus::Expiring { seconds_remaining }
                } else {
                    TokenStatus::Valid { seconds_remaining }
                }
            }
            _ => TokenStatus::Expired,
        }
    }

    fn read_token(&self, key: &str) -> Option<String> {
        let stored = match self.storage.get(key) {
            Ok(stored) => stored?,
            Err(error) => {
                self.fail_closed(&error.to_string());
                return None;
            }
        };
        match self.codec.decode(&stored) {
            Ok(token) => Some(token),
            Err(error) => {
                self.fail_closed(&error.to_string());
                None
            }
        }
    }

    fn read_millis(&self, key: &str) -> Option<i64> {
        match self.storage.get(key) {
            Ok(value) => self.parse_millis(value)?,
            Err(error) => {
                self.fail_closed(&error.to_string());
                None
            }
        }
    }

    /// `Some(None)` for an absent value, `None` (after clearing) for garbage.
    fn parse_millis(&self, value: Option<String>) -> Option<Option<i64>> {
        match value.map(|v| v.trim().parse::<i64>()) {
            None => Some(None),
            Some(Ok(millis)) => Some(Some(millis)),
            Some(Err(error)) => {
                self.fail_closed(&error.to_string());
                None
            }
        }
    }

    fn write_pair(
        &self,
        access_token: &str,
        refresh_token: &str,
        expires_in_secs: Option<u64>,
    ) -> Result<(), StorageError> {
        let now = self.clock.now_millis();
        let lifetime = expires_in_secs.unwrap_or(self.default_expires_in_secs);
        let expires_at = now.saturating_add(duration_millis(Duration::from_secs(lifetime)));

        let access = self.codec.encode(access_token);
        let refresh = self.codec.encode(refresh_token);
        let expiry = expires_at.to_string();
        let activity = now.to_string();
        let entries = [
            (self.keys.access_token.as_str(), access.as_str()),
            (self.keys.refresh_token.as_str(), refresh.as_str()),
            (self.keys.token_expiry.as_str(), expiry.as_str()),
            (self.keys.last_activity.as_str(), activity.as_str()),
        ];

        if let Err(error) = self.storage.set_many(&entries) {
            tracing::error!(error = %error, "Failed to persist tokens, clearing store");
            self.clear();
            return Err(error);
        }
        tracing::debug!(expires_at_ms = expires_at, "Tokens stored");
        Ok(())
    }

    fn clear(&self) {
        if let Err(error) = self.storage.remove_many(&self.keys.all()) {
            tracing::warn!(error = %error, "Batch token removal failed, removing keys one by one");
            for key in self.keys.all() {
                if let Err(error) = self.storage.remove(key) {
                    tracing::warn!(key, error = %error, "Failed to remove token field");
                }
            }
        }
    }

    /// Compares without failing closed; callers hold the write lock.
    fn holds_refresh_token(&self, expected: &str) -> bool {
        match self.storage.get(&self.keys.refresh_token) {
            Ok(Some(stored)) => self
                .codec
                .decode(&stored)
                .is_ok_and(|token| token == expected),
            Ok(None) | Err(_) => false,
        }
    }

    fn fail_closed(&self, reason: &str) {
        tracing::warn!(reason, "Stored session is unreadable, clearing tokens");
        self.remove_tokens();
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("keys", &self.keys)
            .field("refresh_buffer_ms", &self.refresh_buffer_ms)
            .finish_non_exhaustive()
    }
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Status of the stored token for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// No token pair is stored.
    NotAuthenticated,
    /// Token is valid and outside the refresh window.
    Valid {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Token is still accepted but inside the refresh window.
    Expiring {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Token has expired or has no recorded expiry.
    Expired,
}

impl TokenStatus {
    /// Returns true if the token is still accepted by the server.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. } | Self::Expiring { .. })
    }

    /// Returns true if the next request will trigger a refresh.
    #[must_use]
    pub const fn needs_attention(&self) -> bool {
        matches!(self, Self::Expiring { .. } | Self::Expired)
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Not authenticated".to_string(),
            Self::Valid { seconds_remaining } => {
                let secs = *seconds_remaining;
                if secs > 3600 {
                    format!("Valid for {} hours", secs / 3600)
                } else if secs > 60 {
                    format!("Valid for {} minutes", secs / 60)
                } else {
                    format!("Valid for {secs} seconds")
                }
            }
            Self::Expiring { seconds_remaining } => {
                format!("Expiring in {seconds_remaining} seconds (will auto-refresh)")
            }
            Self::Expired => "Expired (will refresh on next request)".to_string(),
        }
    }
}
