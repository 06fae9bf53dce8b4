//! Loading indicators and toast notifications.
//!
//! [`NotificationCenter`] bundles a [`LoadingTracker`] and a
//! [`ToastManager`] that share one event channel, so a UI layer can
//! subscribe once and re-render on every change.

mod loading;
mod toast;

pub use loading::LoadingTracker;
pub use toast::ToastManager;

use std::future::Future;

use sea_domain::{DomainResult, LoadingKind, NotificationSettings, ToastKind, ToastRemoval};
use tokio::sync::broadcast;

/// Change notifications for subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A loading item was started, restarted or stopped.
    LoadingChanged {
        /// Loading id.
        id: String,
        /// True while the item exists.
        active: bool,
    },
    /// A toast was added.
    ToastShown {
        /// Toast id.
        id: String,
        /// Toast severity.
        kind: ToastKind,
    },
    /// A toast left the active set.
    ToastRemoved {
        /// Toast id.
        id: String,
        /// Why it was removed.
        reason: ToastRemoval,
    },
}

const EVENT_CAPACITY: usize = 256;

/// Shared entry point for loading and toast state.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    loading: LoadingTracker,
    toasts: ToastManager,
    events: broadcast::Sender<NotificationEvent>,
}

impl NotificationCenter {
    /// Creates an empty center.
    #[must_use]
    pub fn new(settings: NotificationSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            loading: LoadingTracker::with_events(events.clone()),
            toasts: ToastManager::with_events(settings, events.clone()),
            events,
        }
    }

    /// Loading indicators.
    #[must_use]
    pub const fn loading(&self) -> &LoadingTracker {
        &self.loading
    }

    /// Toasts.
    #[must_use]
    pub const fn toasts(&self) -> &ToastManager {
        &self.toasts
    }

    /// Receives every subsequent loading and toast event.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    /// Runs `future` with a loading item registered under `id`.
    ///
    /// The item is removed when the future completes or is dropped.
    ///
    /// # Errors
    /// Returns an error if `id` is blank; `future` is not polled then.
    pub async fn with_loading<F: Future>(
        &self,
        id: &str,
        kind: LoadingKind,
        message: Option<String>,
        future: F,
    ) -> DomainResult<F::Output> {
        let _guard = self.loading_guard(id, kind, message)?;
        Ok(future.await)
    }

    /// Starts a loading item that is stopped when the guard drops.
    pub(crate) fn loading_guard(
        &self,
        id: &str,
        kind: LoadingKind,
        message: Option<String>,
    ) -> DomainResult<LoadingGuard> {
        let generation = self.loading.start_generation(id, kind, message, None)?;
        Ok(LoadingGuard {
            tracker: self.loading.clone(),
            id: id.to_string(),
            generation,
        })
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NotificationSettings::default())
    }
}

/// Stops a loading item on drop, unless the id was restarted meanwhile.
#[derive(Debug)]
pub(crate) struct LoadingGuard {
    tracker: LoadingTracker,
    id: String,
    generation: u64,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.tracker.stop_generation(&self.id, self.generation);
    }
}
