//! Session state shared by the controller and the request pipeline.

use std::sync::Arc;

use parking_lot::Mutex;
use sea_domain::{SessionState, TokenPayload, User};

use super::TokenStore;
use crate::ports::{SessionStore, StorageError};

/// Lifecycle state plus the session part of the application store.
///
/// Cloning is cheap; clones share the state. Establishing and ending a
/// session happen under one lock, so a late refresh failure cannot end a
/// session that a login has just established.
#[derive(Clone)]
pub struct SessionLifecycle {
    state: Arc<Mutex<SessionState>>,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLifecycle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionLifecycle {
    /// The initial state follows the store.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let initial = if store.is_authenticated() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        };
        Self {
            state: Arc::new(Mutex::new(initial)),
            store,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub(crate) fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Moves to `next` and returns the previous state.
    pub(crate) fn transition(&self, next: SessionState) -> SessionState {
        let mut state = self.state.lock();
        Self::apply(&mut state, next)
    }

    /// Settles the state from the store once a login attempt gave up.
    pub(crate) fn settle_from_store(&self) {
        let mut state = self.state.lock();
        let next = if self.store.is_authenticated() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        };
        Self::apply(&mut state, next);
    }

    /// Stores the tokens and the user of a new session.
    ///
    /// A failed token write leaves the store logged out.
    pub(crate) fn establish(
        &self,
        tokens: &TokenStore,
        payload: &TokenPayload,
        user: User,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if let Err(error) =
            tokens.set_tokens(&payload.access_token, &payload.refresh_token, payload.expires_in)
        {
            self.store.logout_user();
            Self::apply(&mut state, SessionState::LoggedOut);
            return Err(error);
        }
        self.store.set_user(user);
        Self::apply(&mut state, SessionState::LoggedIn);
        Ok(())
    }

    /// Ends the session after the server refused to renew it.
    ///
    /// Does nothing if a token pair is stored again by now. A login or
    /// logout in flight keeps its transient state and settles it itself.
    /// Returns whether the session was ended.
    pub(crate) fn expire(&self, tokens: &TokenStore) -> bool {
        let mut state = self.state.lock();
        if tokens.record().is_some() {
            return false;
        }
        self.store.logout_user();
        if !state.is_transitioning() {
            Self::apply(&mut state, SessionState::LoggedOut);
        }
        true
    }

    fn apply(state: &mut SessionState, next: SessionState) -> SessionState {
        let previous = *state;
        if !previous.can_transition_to(next) {
            tracing::debug!(
                from = previous.label(),
                to = next.label(),
                "Unexpected session transition"
            );
        }
        *state = next;
        previous
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::state::AppStore;
    use crate::test_support::{ManualClock, payload, token_store, user};
    use pretty_assertions::assert_eq;

    const NOW: i64 = 1_700_000_000_000;

    fn setup() -> (SessionLifecycle, TokenStore, AppStore) {
        let (tokens, _) = token_store(ManualClock::at(NOW));
        let store = AppStore::new();
        let lifecycle = SessionLifecycle::new(Arc::new(store.clone()));
        (lifecycle, tokens, store)
    }

    #[test]
    fn test_initial_state_follows_store() {
        let store = AppStore::new();
        store.set_user(user("ada"));
        let lifecycle = SessionLifecycle::new(Arc::new(store));
        assert_eq!(lifecycle.state(), SessionState::LoggedIn);
    }

    #[test]
    fn test_expire_ends_session_without_tokens() {
        let (lifecycle, tokens, store) = setup();
        lifecycle
            .establish(&tokens, &payload("a", "r", 600), user("ada"))
            .unwrap();
        tokens.remove_tokens();

        assert!(lifecycle.expire(&tokens));

        assert_eq!(lifecycle.state(), SessionState::LoggedOut);
        assert!(!store.snapshot().is_authenticated);
    }

    #[test]
    fn test_expire_spares_established_session() {
        let (lifecycle, tokens, store) = setup();
        lifecycle
            .establish(&tokens, &payload("a", "r", 600), user("ada"))
            .unwrap();

        assert!(!lifecycle.expire(&tokens));

        assert_eq!(lifecycle.state(), SessionState::LoggedIn);
        assert!(store.snapshot().is_authenticated);
    }

    #[test]
    fn test_expire_leaves_login_in_flight_to_settle() {
        let (lifecycle, tokens, store) = setup();
        store.set_user(user("ada"));
        lifecycle.transition(SessionState::LoggingIn);

        assert!(lifecycle.expire(&tokens));
        assert_eq!(lifecycle.state(), SessionState::LoggingIn);

        lifecycle.settle_from_store();
        assert_eq!(lifecycle.state(), SessionState::LoggedOut);
    }
}
