//! In-memory application store.
//!
//! Holds the signed-in user and the session flags. Readers take snapshots
//! or subscribe to changes; the session controller writes through the
//! [`SessionStore`] port.

use std::sync::Arc;

use sea_domain::User;
use tokio::sync::watch;

use crate::ports::SessionStore;

/// Snapshot of the session-related application state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    /// The signed-in user.
    pub user: Option<User>,
    /// Whether a session is believed to exist.
    pub is_authenticated: bool,
    /// Whether a login or logout is running.
    pub is_loading: bool,
}

/// Observable store backed by a watch channel.
#[derive(Debug, Clone)]
pub struct AppStore {
    state: Arc<watch::Sender<AppState>>,
}

impl AppStore {
    /// Creates an empty, logged-out store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(AppState::default())),
        }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Receives every subsequent state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    fn update(&self, apply: impl FnOnce(&mut AppState)) {
        self.state.send_if_modified(|state| {
            let before = state.clone();
            apply(state);
            *state != before
        });
    }
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for AppStore {
    fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    fn set_user(&self, user: User) {
        self.update(|state| {
            state.user = Some(user);
            state.is_authenticated = true;
        });
    }

    fn logout_user(&self) {
        self.update(|state| {
            state.user = None;
            state.is_authenticated = false;
        });
    }

    fn set_loading(&self, loading: bool) {
        self.update(|state| state.is_loading = loading);
    }
}
