//! Sea Application - Session coordination
//!
//! This crate implements the authenticated-request coordination layer:
//! - Port traits for storage, clock, endpoints, transport and the app store
//! - Token storage with fail-closed decoding
//! - Single-flight token refresh with a FIFO request queue
//! - The session controller and the notification center

pub mod auth;
pub mod error;
pub mod notification;
pub mod ports;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{
    AuthorizedClient, Enqueued, PendingRequest, RefreshOutcome, RefreshResult, RequestQueue,
    SessionController, SessionLifecycle, TokenRefresher, TokenStatus, TokenStore, UserPoller,
};
pub use error::{ApplicationError, ApplicationResult};
pub use notification::{LoadingTracker, NotificationCenter, NotificationEvent, ToastManager};
pub use state::{AppState, AppStore};
