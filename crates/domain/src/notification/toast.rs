//! Toast notification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::settings::NotificationSettings;

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    /// Operation completed.
    Success,
    /// Operation failed.
    Error,
    /// Something needs attention.
    Warning,
    /// Neutral information.
    #[default]
    Info,
}

impl ToastKind {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// Button attached to a toast.
#[derive(Clone)]
pub struct ToastAction {
    /// Button label.
    pub label: String,
    on_click: Arc<dyn Fn() + Send + Sync>,
}

impl ToastAction {
    /// Creates an action with a click handler.
    pub fn new(label: impl Into<String>, on_click: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            on_click: Arc::new(on_click),
        }
    }

    /// Invokes the click handler.
    pub fn trigger(&self) {
        (self.on_click)();
    }
}

impl fmt::Debug for ToastAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// What a caller asks to show. Converted into a [`Toast`] by the toast manager.
#[derive(Debug, Clone)]
pub struct ToastRequest {
    /// Severity.
    pub kind: ToastKind,
    /// Headline.
    pub title: String,
    /// Optional body text.
    pub message: Option<String>,
    /// Explicit display time; the kind's default is used when `None`.
    pub duration: Option<Duration>,
    /// Stays until dismissed.
    pub persistent: bool,
    /// Optional button.
    pub action: Option<ToastAction>,
}

impl ToastRequest {
    /// Creates a request with the kind's default duration.
    #[must_use]
    pub fn new(kind: ToastKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: None,
            duration: None,
            persistent: false,
            action: None,
        }
    }

    /// Sets the body text.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets an explicit display time.
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Keeps the toast until it is dismissed.
    #[must_use]
    pub const fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Attaches a button.
    #[must_use]
    pub fn with_action(mut self, action: ToastAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Resolves how long the toast stays visible, or `None` if it never
    /// auto-dismisses. Errors default to a longer time than other kinds;
    /// a zero duration behaves like `persistent`.
    #[must_use]
    pub fn effective_duration(&self, settings: &NotificationSettings) -> Option<Duration> {
        if self.persistent {
            return None;
        }
        let duration = self.duration.unwrap_or_else(|| match self.kind {
            ToastKind::Error => Duration::from_millis(settings.error_toast_duration_ms),
            _ => Duration::from_millis(settings.default_toast_duration_ms),
        });
        (!duration.is_zero()).then_some(duration)
    }
}

/// A toast that has been shown.
#[derive(Debug, Clone)]
pub struct Toast {
    /// Assigned identifier.
    pub id: String,
    /// Severity.
    pub kind: ToastKind,
    /// Headline.
    pub title: String,
    /// Optional body text.
    pub message: Option<String>,
    /// Auto-dismiss delay; `None` for persistent toasts.
    pub duration: Option<Duration>,
    /// Optional button.
    pub action: Option<ToastAction>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Toast {
    /// Builds a toast from a request.
    #[must_use]
    pub fn from_request(
        id: String,
        request: ToastRequest,
        settings: &NotificationSettings,
    ) -> Self {
        let duration = request.effective_duration(settings);
        Self {
            id,
            kind: request.kind,
            title: request.title,
            message: request.message,
            duration,
            action: request.action,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the toast never auto-dismisses.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.duration.is_none()
    }
}

/// Why a toast left the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastRemoval {
    /// Its timer fired.
    Expired,
    /// The user closed it.
    Dismissed,
    /// All toasts were cleared.
    Cleared,
}
