//! Session coordination.
//!
//! This module provides:
//! - Persistent token storage with expiry and idle tracking
//! - The single-flight refresh orchestrator and its request queue
//! - The authenticated request pipeline
//! - The session controller and the lifecycle state it shares with the
//!   pipeline

mod client;
mod lifecycle;
mod refresher;
mod request_queue;
mod session;
mod token_store;

pub use client::AuthorizedClient;
pub use lifecycle::SessionLifecycle;
pub use refresher::{RefreshOutcome, RefreshResult, TokenRefresher};
pub use request_queue::{Enqueued, PendingRequest, RequestQueue};
pub use session::{AUTH_LOADING_ID, SessionController, UserPoller};
pub use token_store::{TokenStatus, TokenStore};
