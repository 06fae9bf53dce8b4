//! Named loading operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Scope a loading indicator applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadingKind {
    /// Blocks the whole application (full-screen overlay).
    Global,
    /// Local to a single component.
    #[default]
    Component,
    /// Covers a page body.
    Page,
    /// Background API call.
    Api,
}

/// A running operation, keyed by a caller-supplied id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingItem {
    /// Unique key of the logical operation.
    pub id: String,
    /// Indicator scope.
    pub kind: LoadingKind,
    /// Optional text shown next to the indicator.
    pub message: Option<String>,
    /// Optional completion percentage (0-100).
    pub progress: Option<u8>,
    /// When the operation was (re)started.
    pub started_at: DateTime<Utc>,
}

impl LoadingItem {
    /// Creates a validated loading item.
    ///
    /// # Errors
    /// Returns an error if `id` is blank or `progress` exceeds 100.
    pub fn new(
        id: impl Into<String>,
        kind: LoadingKind,
        message: Option<String>,
        progress: Option<u8>,
    ) -> DomainResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidIdentifier(
                "loading id cannot be empty".to_string(),
            ));
        }
        validate_progress(progress)?;
        Ok(Self {
            id,
            kind,
            message,
            progress,
            started_at: Utc::now(),
        })
    }

    /// Applies a partial update in place.
    ///
    /// # Errors
    /// Returns an error if the new progress exceeds 100; the item is left untouched.
    pub fn apply(&mut self, update: LoadingUpdate) -> DomainResult<()> {
        validate_progress(update.progress)?;
        if let Some(progress) = update.progress {
            self.progress = Some(progress);
        }
        if let Some(message) = update.message {
            self.message = Some(message);
        }
        Ok(())
    }
}

fn validate_progress(progress: Option<u8>) -> DomainResult<()> {
    match progress {
        Some(p) if p > 100 => Err(DomainError::InvalidProgress(p)),
        _ => Ok(()),
    }
}

/// Partial update for a running operation. `None` fields are left as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingUpdate {
    /// New completion percentage.
    pub progress: Option<u8>,
    /// New message.
    pub message: Option<String>,
}

impl LoadingUpdate {
    /// Update that only sets progress.
    #[must_use]
    pub const fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            message: None,
        }
    }

    /// Update that only sets the message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            progress: None,
            message: Some(message.into()),
        }
    }
}
