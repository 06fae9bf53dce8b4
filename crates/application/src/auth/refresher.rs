//! Token refresh orchestration.
//!
//! [`TokenRefresher`] performs at most one refresh call at a time. Callers
//! arriving while a refresh is in flight join it and receive the same
//! outcome. The network call runs on its own task so a caller that stops
//! waiting cannot cancel it for everyone else.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use sea_domain::{AuthError, AuthSettings, TokenPayload, token_preview};
use tokio::sync::oneshot;

use super::TokenStore;
use crate::ports::AuthApi;

/// What a refresh attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshResult {
    /// New tokens were issued and stored.
    Refreshed(TokenPayload),
    /// No refresh token was stored; there is no session to renew.
    NoSession,
    /// The stored pair changed while the call was in flight, typically by a
    /// new login. Its outcome was discarded; whatever is stored now is
    /// current.
    Superseded,
}

/// Outcome shared with every caller of one refresh cycle.
pub type RefreshOutcome = Result<RefreshResult, AuthError>;

type Waiters = Vec<oneshot::Sender<RefreshOutcome>>;

struct RefresherInner {
    api: Arc<dyn AuthApi>,
    tokens: TokenStore,
    timeout: Duration,
    /// `Some` while a refresh is in flight; holds everyone waiting on it.
    in_flight: Mutex<Option<Waiters>>,
    refresh_count: AtomicUsize,
}

/// Single-flight wrapper around the refresh endpoint.
#[derive(Clone)]
pub struct TokenRefresher {
    inner: Arc<RefresherInner>,
}

impl std::fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("timeout", &self.inner.timeout)
            .field("is_refreshing", &self.is_refreshing())
            .field("refresh_count", &self.refresh_count())
            .finish_non_exhaustive()
    }
}

impl TokenRefresher {
    /// Creates a refresher using the configured refresh timeout.
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, tokens: TokenStore, settings: &AuthSettings) -> Self {
        Self {
            inner: Arc::new(RefresherInner {
                api,
                tokens,
                timeout: settings.refresh_timeout(),
                in_flight: Mutex::new(None),
                refresh_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Refreshes the access token, joining the refresh already in flight if
    /// there is one.
    ///
    /// # Errors
    /// Returns the refresh failure (endpoint error, network error or
    /// timeout). Tokens are cleared before the error is returned, unless
    /// they were replaced meanwhile; that case yields
    /// [`RefreshResult::Superseded`] instead.
    pub async fn refresh_access_token(&self) -> RefreshOutcome {
        let (sender, receiver) = oneshot::channel();
        let leads = {
            let mut slot = self.inner.in_flight.lock();
            match slot.as_mut() {
                Some(waiters) => {
                    waiters.push(sender);
                    false
                }
                None => {
                    *slot = Some(vec![sender]);
                    true
                }
            }
        };

        if leads {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.run().await });
        } else {
            tracing::debug!("Joining refresh already in flight");
        }

        receiver.await.unwrap_or(Err(AuthError::RefreshInterrupted))
    }

    /// Returns true while a refresh call is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.in_flight.lock().is_some()
    }

    /// Number of refresh calls sent to the endpoint so far.
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.inner.refresh_count.load(Ordering::SeqCst)
    }
}

impl RefresherInner {
    async fn run(&self) {
        let mut flight = FlightGuard {
            inner: self,
            outcome: None,
        };
        flight.outcome = Some(self.perform().await);
    }

    async fn perform(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.tokens.refresh_token() else {
            tracing::debug!("No refresh token stored, nothing to refresh");
            self.tokens.remove_tokens();
            return Ok(RefreshResult::NoSession);
        };

        self.refresh_count.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            refresh_token = %token_preview(&refresh_token),
            "Refreshing access token"
        );

        let result = match tokio::time::timeout(self.timeout, self.api.refresh(&refresh_token)).await
        {
            Ok(result) => result,
            Err(_) => Err(AuthError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        match result {
            Ok(payload) => {
                let stored = self.tokens.replace_tokens(
                    &refresh_token,
                    &payload.access_token,
                    &payload.refresh_token,
                    payload.expires_in,
                )?;
                if !stored {
                    tracing::info!("Session replaced during refresh, discarding renewed tokens");
                    return Ok(RefreshResult::Superseded);
                }
                tracing::info!(
                    access_token = %token_preview(&payload.access_token),
                    expires_in = ?payload.expires_in,
                    "Access token refreshed"
                );
                Ok(RefreshResult::Refreshed(payload))
            }
            Err(error) => {
                if !self.tokens.remove_tokens_if(&refresh_token) {
                    tracing::info!(error = %error, "Refresh failed for a session that was since replaced");
                    return Ok(RefreshResult::Superseded);
                }
                tracing::warn!(error = %error, "Token refresh failed, clearing tokens");
                Err(error)
            }
        }
    }
}

/// Releases the in-flight slot and notifies all waiters, also when the
/// refresh task unwinds.
struct FlightGuard<'a> {
    inner: &'a RefresherInner,
    outcome: Option<RefreshOutcome>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let waiters = self.inner.in_flight.lock().take().unwrap_or_default();
        let outcome = self
            .outcome
            .take()
            .unwrap_or(Err(AuthError::RefreshInterrupted));
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}
