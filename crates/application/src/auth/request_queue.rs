//! Single-flight request queue.
//!
//! While a token refresh is in flight, requests that need a token are
//! parked here instead of starting their own refresh. When the refresh
//! settles the queue is drained in insertion order: every entry is either
//! replayed with the new token attached or rejected with the refresh error.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use sea_domain::{AuthError, Authorize};
use tokio::sync::oneshot;

struct QueuedRequest<R> {
    request: R,
    responder: oneshot::Sender<Result<R, AuthError>>,
}

struct QueueState<R> {
    refreshing: bool,
    entries: VecDeque<QueuedRequest<R>>,
}

/// Coordinator shared by every request of one session.
///
/// Two states: idle and refreshing. Only the caller that moves the queue
/// from idle to refreshing may start a refresh; all others wait.
pub struct RequestQueue<R> {
    state: Arc<Mutex<QueueState<R>>>,
}

impl<R> Clone for RequestQueue<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<R> Default for RequestQueue<R> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                refreshing: false,
                entries: VecDeque::new(),
            })),
        }
    }
}

impl<R> fmt::Debug for RequestQueue<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RequestQueue")
            .field("refreshing", &state.refreshing)
            .field("len", &state.entries.len())
            .finish()
    }
}

/// Result of [`RequestQueue::enqueue`].
#[derive(Debug)]
pub struct Enqueued<R> {
    /// Resolves once the queue is drained.
    pub pending: PendingRequest<R>,
    /// True if this call moved the queue into the refreshing state; the
    /// caller owns starting the refresh.
    pub starts_refresh: bool,
}

/// A parked request waiting for the queue to drain.
#[derive(Debug)]
pub struct PendingRequest<R> {
    receiver: oneshot::Receiver<Result<R, AuthError>>,
}

impl<R> PendingRequest<R> {
    /// Waits for the drain and returns the re-authorized request.
    ///
    /// # Errors
    /// Returns the refresh error, or `AuthError::QueueCleared` if the queue
    /// was cleared or dropped before the refresh settled.
    pub async fn wait(self) -> Result<R, AuthError> {
        self.receiver.await.unwrap_or(Err(AuthError::QueueCleared))
    }
}

impl<R: Authorize> RequestQueue<R> {
    /// Creates an idle, empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a request, entering the refreshing state if idle.
    ///
    /// Checking the state and appending happen under one lock, so exactly
    /// one caller per refresh cycle sees `starts_refresh == true`.
    pub fn enqueue(&self, request: R) -> Enqueued<R> {
        let (responder, receiver) = oneshot::channel();
        let mut state = self.state.lock();
        let starts_refresh = !state.refreshing;
        state.refreshing = true;
        state.entries.push_back(QueuedRequest { request, responder });
        Enqueued {
            pending: PendingRequest { receiver },
            starts_refresh,
        }
    }

    /// Parks a request behind the refresh already in flight.
    ///
    /// # Errors
    /// Returns the request unchanged when no refresh is running, since
    /// nothing would ever drain it.
    pub fn add(&self, request: R) -> Result<PendingRequest<R>, R> {
        let mut state = self.state.lock();
        if !state.refreshing {
            return Err(request);
        }
        let (responder, receiver) = oneshot::channel();
        state.entries.push_back(QueuedRequest { request, responder });
        Ok(PendingRequest { receiver })
    }

    /// Drains the queue in FIFO order and returns to idle.
    ///
    /// With `Ok(token)` every entry is resolved with its request
    /// re-authorized by `token`; with `Err(error)` every entry is rejected
    /// with a clone of `error`. Returns the number of entries drained.
    pub fn process(&self, outcome: Result<&str, &AuthError>) -> usize {
        let entries = self.take_all();
        let drained = entries.len();
        for entry in entries {
            let result = match outcome {
                Ok(token) => Ok(entry.request.authorize(token)),
                Err(error) => Err(error.clone()),
            };
            // The waiter may have gone away; its request is simply dropped.
            let _ = entry.responder.send(result);
        }
        match outcome {
            Ok(_) => tracing::debug!(released = drained, "Request queue drained"),
            Err(error) => tracing::debug!(rejected = drained, error = %error, "Request queue rejected"),
        }
        drained
    }

    /// Rejects every entry with `AuthError::QueueCleared` and forces the
    /// queue back to idle. Returns the number of entries rejected.
    pub fn clear(&self) -> usize {
        let entries = self.take_all();
        let cleared = entries.len();
        for entry in entries {
            let _ = entry.responder.send(Err(AuthError::QueueCleared));
        }
        if cleared > 0 {
            tracing::warn!(cleared, "Request queue cleared");
        }
        cleared
    }

    /// Returns true while a refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().refreshing
    }

    /// Number of parked requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns true if nothing is parked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_all(&self) -> VecDeque<QueuedRequest<R>> {
        let mut state = self.state.lock();
        state.refreshing = false;
        std::mem::take(&mut state.entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sea_domain::ApiRequest;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Tagged {
        tag: u32,
        token: Option<String>,
    }

    impl Tagged {
        fn new(tag: u32) -> Self {
            Self { tag, token: None }
        }
    }

    impl Authorize for Tagged {
        fn authorize(mut self, access_token: &str) -> Self {
            self.token = Some(access_token.to_string());
            self
        }
    }

    #[test]
    fn test_only_first_enqueue_starts_refresh() {
        let queue = RequestQueue::new();
        let first = queue.enqueue(Tagged::new(1));
        let second = queue.enqueue(Tagged::new(2));
        let third = queue.enqueue(Tagged::new(3));

        assert!(first.starts_refresh);
        assert!(!second.starts_refresh);
        assert!(!third.starts_refresh);
        assert!(queue.is_refreshing());
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_add_rejected_when_idle() {
        let queue = RequestQueue::new();
        let returned = queue.add(Tagged::new(7)).unwrap_err();
        assert_eq!(returned, Tagged::new(7));
        assert!(queue.is_empty());

        let _leader = queue.enqueue(Tagged::new(1));
        assert!(queue.add(Tagged::new(2)).is_ok());
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_success_replays_in_fifo_order_with_new_token() {
        let queue = RequestQueue::new();
        let pending: Vec<_> = (1..=5)
            .map(|tag| queue.enqueue(Tagged::new(tag)).pending)
            .collect();

        assert_eq!(queue.process(Ok("fresh")), 5);
        assert!(!queue.is_refreshing());
        assert!(queue.is_empty());

        let mut resolved = Vec::new();
        for p in pending {
            resolved.push(p.wait().await.unwrap());
        }
        assert_eq!(
            resolved.iter().map(|r| r.tag).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        assert!(resolved.iter().all(|r| r.token.as_deref() == Some("fresh")));
    }

    #[tokio::test]
    async fn test_failure_rejects_every_entry_with_same_error() {
        let queue = RequestQueue::new();
        let pending: Vec<_> = (0..4)
            .map(|tag| queue.enqueue(Tagged::new(tag)).pending)
            .collect();
        let error = AuthError::Network {
            message: "connection reset".into(),
        };

        queue.process(Err(&error));

        for p in pending {
            assert_eq!(p.wait().await.unwrap_err(), error);
        }
    }

    #[tokio::test]
    async fn test_clear_rejects_and_resets() {
        let queue = RequestQueue::new();
        let a = queue.enqueue(Tagged::new(1)).pending;
        let b = queue.enqueue(Tagged::new(2)).pending;

        assert_eq!(queue.clear(), 2);
        assert!(!queue.is_refreshing());
        assert_eq!(a.wait().await.unwrap_err(), AuthError::QueueCleared);
        assert_eq!(b.wait().await.unwrap_err(), AuthError::QueueCleared);

        // The next expired request starts a fresh cycle.
        assert!(queue.enqueue(Tagged::new(3)).starts_refresh);
    }

    #[tokio::test]
    async fn test_abandoned_waiter_does_not_block_drain() {
        let queue = RequestQueue::new();
        drop(queue.enqueue(Tagged::new(1)).pending);
        let kept = queue.enqueue(Tagged::new(2)).pending;

        assert_eq!(queue.process(Ok("t")), 2);
        assert_eq!(kept.wait().await.unwrap().tag, 2);
    }

    #[tokio::test]
    async fn test_dropped_queue_reports_cleared() {
        let queue = RequestQueue::new();
        let pending = queue.enqueue(ApiRequest::get("/projects")).pending;
        drop(queue);
        assert_eq!(pending.wait().await.unwrap_err(), AuthError::QueueCleared);
    }
}
