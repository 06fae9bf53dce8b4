//! Authenticated request pipeline.
//!
//! Attaches the access token to outgoing requests, parks requests in the
//! [`RequestQueue`] while the token is being renewed, and replays a request
//! once after a 401.

use std::sync::Arc;

use sea_domain::{ApiRequest, ApiResponse, AuthError, Authorize, RequestOptions};
use serde::de::DeserializeOwned;

use super::{Enqueued, RefreshResult, RequestQueue, SessionLifecycle, TokenRefresher, TokenStore};
use crate::ports::Transport;

/// API client that owns token handling for every request it sends.
pub struct AuthorizedClient<T> {
    transport: Arc<T>,
    tokens: TokenStore,
    refresher: TokenRefresher,
    queue: RequestQueue<ApiRequest>,
    lifecycle: SessionLifecycle,
}

impl<T> Clone for AuthorizedClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            tokens: self.tokens.clone(),
            refresher: self.refresher.clone(),
            queue: self.queue.clone(),
            lifecycle: self.lifecycle.clone(),
        }
    }
}

impl<T: Transport + 'static> AuthorizedClient<T> {
    /// Creates a client with its own request queue.
    ///
    /// `lifecycle` must be the one the session controller uses, so a
    /// failed refresh ends the controller's session too.
    #[must_use]
    pub fn new(
        transport: T,
        tokens: TokenStore,
        refresher: TokenRefresher,
        lifecycle: SessionLifecycle,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            tokens,
            refresher,
            queue: RequestQueue::new(),
            lifecycle,
        }
    }

    /// Sends a request, refreshing the token first if needed.
    ///
    /// # Errors
    /// Returns the transport error, the refresh error for requests that
    /// waited on a failed refresh, `AuthError::NotAuthenticated` when there
    /// is no session, or the mapped HTTP error for non-2xx responses unless
    /// `skip_error_handling` is set.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let options = request.options;
        if options.skip_auth {
            let response = self.transport.send(request).await?;
            return Self::finish(options, response);
        }

        let request = self.authorize(request).await?;
        let response = self.transport.send(request.clone()).await?;
        if !response.is_unauthorized() || options.retried {
            return Self::finish(options, response);
        }

        let rejected = request.bearer_token().map(str::to_string);
        tracing::debug!(path = %request.path, "Request rejected with 401, refreshing and retrying once");
        let mut retry = request;
        retry.options.retried = true;
        let retry = self.wait_for_refresh(retry, rejected).await?;
        let response = self.transport.send(retry).await?;
        Self::finish(options, response)
    }

    /// Sends a request and decodes the JSON body.
    ///
    /// # Errors
    /// Same as [`execute`](Self::execute), plus `AuthError::InvalidResponse`
    /// if the body does not decode into `R`.
    pub async fn execute_json<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<R, AuthError> {
        self.execute(request).await?.json()
    }

    /// Rejects every parked request and resets the queue.
    pub fn clear_queue(&self) -> usize {
        self.queue.clear()
    }

    /// The queue requests wait in during a refresh.
    #[must_use]
    pub const fn queue(&self) -> &RequestQueue<ApiRequest> {
        &self.queue
    }

    async fn authorize(&self, request: ApiRequest) -> Result<ApiRequest, AuthError> {
        match usable_token(&self.tokens, None) {
            Some(token) => Ok(request.authorize(&token)),
            None => self.wait_for_refresh(request, None).await,
        }
    }

    async fn wait_for_refresh(
        &self,
        request: ApiRequest,
        rejected: Option<String>,
    ) -> Result<ApiRequest, AuthError> {
        let Enqueued {
            pending,
            starts_refresh,
        } = self.queue.enqueue(request);
        if starts_refresh {
            self.spawn_refresh(rejected);
        }
        pending.wait().await
    }

    /// Runs one refresh cycle and drains the queue with its outcome.
    fn spawn_refresh(&self, rejected: Option<String>) {
        let tokens = self.tokens.clone();
        let refresher = self.refresher.clone();
        let queue = self.queue.clone();
        let lifecycle = self.lifecycle.clone();

        tokio::spawn(async move {
            // Another cycle may have renewed the token since this one was requested.
            if let Some(token) = usable_token(&tokens, rejected.as_deref()) {
                queue.process(Ok(&token));
                return;
            }
            match refresher.refresh_access_token().await {
                Ok(RefreshResult::Refreshed(payload)) => {
                    queue.process(Ok(&payload.access_token));
                }
                Ok(RefreshResult::Superseded) => {
                    let current = usable_token(&tokens, rejected.as_deref());
                    queue.process(current.as_deref().ok_or(&AuthError::NotAuthenticated));
                }
                Ok(RefreshResult::NoSession) => {
                    lifecycle.expire(&tokens);
                    queue.process(Err(&AuthError::NotAuthenticated));
                }
                Err(error) => {
                    if lifecycle.expire(&tokens) {
                        tracing::info!(error = %error, "Session ended after failed refresh");
                    }
                    queue.process(Err(&error));
                }
            }
        });
    }

    fn finish(options: RequestOptions, response: ApiResponse) -> Result<ApiResponse, AuthError> {
        if options.skip_error_handling {
            Ok(response)
        } else {
            response.error_for_status()
        }
    }
}

/// The stored access token, if it is outside the refresh window and is not
/// the one the server just rejected.
fn usable_token(tokens: &TokenStore, rejected: Option<&str>) -> Option<String> {
    if tokens.is_token_expired() {
        return None;
    }
    tokens
        .access_token()
        .filter(|token| Some(token.as_str()) != rejected)
}
