//! Session controller.
//!
//! Composes the token store, the refresher and the application store into
//! login, logout and user reconciliation. It is the only writer of the
//! session part of the application store.

use std::sync::Arc;

use sea_domain::{AuthError, AuthSettings, Credentials, LoadingKind, SessionState, User};
use tokio::task::JoinHandle;

use super::{RefreshResult, SessionLifecycle, TokenRefresher, TokenStore};
use crate::error::ApplicationResult;
use crate::notification::{LoadingGuard, NotificationCenter};
use crate::ports::{AuthApi, SessionStore};

/// Loading id used for login and logout.
pub const AUTH_LOADING_ID: &str = "auth";

/// Login, logout and session reconciliation.
#[derive(Clone)]
pub struct SessionController {
    api: Arc<dyn AuthApi>,
    tokens: TokenStore,
    refresher: TokenRefresher,
    store: Arc<dyn SessionStore>,
    settings: AuthSettings,
    notifications: Option<NotificationCenter>,
    lifecycle: SessionLifecycle,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state())
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Creates a controller over `lifecycle`, which the request pipeline
    /// should share.
    #[must_use]
    pub fn new(
        api: Arc<dyn AuthApi>,
        tokens: TokenStore,
        refresher: TokenRefresher,
        lifecycle: SessionLifecycle,
        settings: AuthSettings,
    ) -> Self {
        Self {
            api,
            tokens,
            refresher,
            store: Arc::clone(lifecycle.store()),
            settings,
            notifications: None,
            lifecycle,
        }
    }

    /// Reports login/logout progress and forced logouts to `center`.
    #[must_use]
    pub fn with_notifications(mut self, center: NotificationCenter) -> Self {
        self.notifications = Some(center);
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    /// The signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.store.user()
    }

    /// Signs in and returns the user.
    ///
    /// Tokens are only written once the endpoint succeeded; a failed login
    /// leaves the previous session untouched.
    ///
    /// # Errors
    /// Returns a domain error for blank credentials, the endpoint error, or
    /// a storage error if the tokens cannot be persisted.
    pub async fn login(&self, credentials: &Credentials) -> ApplicationResult<User> {
        credentials.validate()?;

        let mut attempt = Attempt::begin(self, SessionState::LoggingIn, "Signing in");
        let response = self.api.login(credentials).await.inspect_err(|error| {
            tracing::warn!(email = %credentials.email, error = %error, "Login failed");
        })?;

        self.lifecycle
            .establish(&self.tokens, &response.tokens, response.user.clone())?;
        attempt.settled();

        tracing::info!(user_id = %response.user.id, "Logged in");
        Ok(response.user)
    }

    /// Ends the session.
    ///
    /// The server is notified on a best-effort basis. Local tokens and the
    /// stored user are always cleared, also when the call fails or this
    /// future is dropped.
    pub async fn logout(&self) {
        let _cleanup = LogoutCleanup {
            controller: self,
            _busy: Attempt::busy(self, SessionState::LoggingOut, "Signing out"),
        };

        let access_token = self.tokens.access_token();
        if let Err(error) = self.api.logout(access_token.as_deref()).await {
            tracing::warn!(error = %error, "Server logout failed, local session cleared anyway");
        }
    }

    /// Clears a stale session.
    ///
    /// Returns false if the store believed a session existed but the tokens
    /// are missing or expired; the session is cleared in that case.
    pub fn check_auth_status(&self) -> bool {
        if !self.store.is_authenticated() {
            return true;
        }
        if self.tokens.access_token().is_some() && !self.tokens.is_token_expired() {
            return true;
        }
        tracing::info!("Stored tokens missing or expired, clearing stale session");
        self.clear_local_session();
        false
    }

    /// Re-fetches the current user.
    ///
    /// A 401 from the endpoint, or a refresh that left no tokens behind,
    /// ends the session before the error is returned. Other failures leave
    /// it in place.
    ///
    /// # Errors
    /// Returns `AuthError::NotAuthenticated` without a session, or the
    /// refresh or endpoint error.
    pub async fn refresh_user(&self) -> Result<User, AuthError> {
        if !self.store.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        match self.fetch_current_user().await {
            Ok(user) => {
                self.store.set_user(user.clone());
                Ok(user)
            }
            Err(error) => {
                if error.is_unauthorized() || self.tokens.refresh_token().is_none() {
                    tracing::info!(error = %error, "Current user rejected, ending session");
                    self.force_logout().await;
                }
                Err(error)
            }
        }
    }

    /// Authenticated flag, stored user and a stored token pair.
    ///
    /// The token pair may be expired; it only has to exist.
    #[must_use]
    pub fn has_valid_session(&self) -> bool {
        self.store.is_authenticated() && self.store.user().is_some() && self.tokens.record().is_some()
    }

    /// Reconciles local state with the server on start-up.
    ///
    /// Restores a persisted session (refreshing the token if needed) and
    /// fetches the user. Any failure to fetch the user ends the session.
    /// Returns whether a session is active afterwards.
    pub async fn mount(&self) -> bool {
        if !self.check_auth_status() {
            return false;
        }
        if self.tokens.refresh_token().is_none() {
            if self.store.is_authenticated() {
                self.clear_local_session();
            }
            return false;
        }

        match self.fetch_current_user().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Session restored");
                self.store.set_user(user);
                self.set_state(SessionState::LoggedIn);
                true
            }
            Err(error) => {
                tracing::info!(error = %error, "Session could not be restored, logging out");
                self.force_logout().await;
                false
            }
        }
    }

    /// Polls the current user every `user_poll_interval_secs` while a
    /// session exists. The task stops when the returned handle drops.
    #[must_use]
    pub fn start_user_polling(&self) -> UserPoller {
        let controller = self.clone();
        let period = self.settings.user_poll_interval();
        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticks.tick().await;
                if !controller.store.is_authenticated() {
                    continue;
                }
                if let Err(error) = controller.refresh_user().await {
                    tracing::debug!(error = %error, "User poll failed");
                }
            }
        });
        UserPoller { handle }
    }

    /// Marks user activity for the idle timeout.
    pub fn record_activity(&self) {
        self.tokens.update_last_activity();
    }

    /// Logs out if the session has been idle longer than the configured
    /// timeout. Returns true if it did.
    pub async fn enforce_idle_timeout(&self) -> bool {
        let has_session = self.store.is_authenticated() || self.tokens.refresh_token().is_some();
        if !has_session || !self.tokens.is_session_expired(self.settings.idle_timeout()) {
            return false;
        }
        tracing::info!(
            idle_timeout_minutes = self.settings.idle_timeout_minutes,
            "Session idle for too long, logging out"
        );
        self.force_logout().await;
        true
    }

    async fn fetch_current_user(&self) -> Result<User, AuthError> {
        let access_token = self.fresh_access_token().await?;
        self.api.current_user(&access_token).await
    }

    async fn fresh_access_token(&self) -> Result<String, AuthError> {
        if !self.tokens.is_token_expired()
            && let Some(token) = self.tokens.access_token()
        {
            return Ok(token);
        }
        match self.refresher.refresh_access_token().await? {
            RefreshResult::Refreshed(payload) => Ok(payload.access_token),
            RefreshResult::Superseded => self.tokens.access_token().ok_or(AuthError::NotAuthenticated),
            RefreshResult::NoSession => Err(AuthError::NotAuthenticated),
        }
    }

    async fn force_logout(&self) {
        self.logout().await;
        if let Some(center) = &self.notifications {
            center.toasts().warning(
                "Session expired",
                Some("Please sign in again.".to_string()),
            );
        }
    }

    fn clear_local_session(&self) {
        self.tokens.remove_tokens();
        self.store.logout_user();
        self.set_state(SessionState::LoggedOut);
    }

    fn set_state(&self, next: SessionState) -> SessionState {
        self.lifecycle.transition(next)
    }

    fn loading_indicator(&self, message: &str) -> Option<LoadingGuard> {
        let center = self.notifications.as_ref()?;
        center
            .loading_guard(AUTH_LOADING_ID, LoadingKind::Global, Some(message.to_string()))
            .ok()
    }
}

/// Loading flag and transient state of a login or logout.
///
/// On drop the loading flag is cleared; an unsettled attempt settles the
/// state from whatever session the store holds by then.
struct Attempt<'a> {
    controller: &'a SessionController,
    unsettled: bool,
    _indicator: Option<LoadingGuard>,
}

impl<'a> Attempt<'a> {
    fn begin(controller: &'a SessionController, state: SessionState, message: &str) -> Self {
        controller.set_state(state);
        controller.store.set_loading(true);
        Self {
            controller,
            unsettled: true,
            _indicator: controller.loading_indicator(message),
        }
    }

    /// Like `begin`, but the state is left for someone else to settle.
    fn busy(controller: &'a SessionController, state: SessionState, message: &str) -> Self {
        let mut attempt = Self::begin(controller, state, message);
        attempt.unsettled = false;
        attempt
    }

    fn settled(&mut self) {
        self.unsettled = false;
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if self.unsettled {
            self.controller.lifecycle.settle_from_store();
        }
        self.controller.store.set_loading(false);
    }
}

/// Local half of logout; runs on drop.
struct LogoutCleanup<'a> {
    controller: &'a SessionController,
    _busy: Attempt<'a>,
}

impl Drop for LogoutCleanup<'_> {
    fn drop(&mut self) {
        self.controller.clear_local_session();
        tracing::info!("Logged out");
    }
}

/// Handle of the user polling task; aborts the task when dropped.
#[derive(Debug)]
pub struct UserPoller {
    handle: JoinHandle<()>,
}

impl UserPoller {
    /// Stops polling.
    pub fn stop(self) {
        drop(self);
    }

    /// Returns true once the task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for UserPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
