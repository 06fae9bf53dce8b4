//! Sea Infrastructure - Adapters and wiring
//!
//! This crate provides concrete implementations of the ports defined in
//! the application layer: reqwest transport and auth endpoints, file and
//! memory storage, the token codec, the system clock and settings loading.

pub mod adapters;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod http;
pub mod storage;

pub use adapters::{Base64TokenCodec, SystemClock};
pub use auth::HttpAuthApi;
pub use bootstrap::SessionServices;
pub use config::{ConfigError, load_settings};
pub use http::{HttpSetupError, ReqwestTransport};
pub use storage::{FileStorage, MemoryStorage};
