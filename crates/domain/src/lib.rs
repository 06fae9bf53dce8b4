//! Sea Domain - Core session types
//!
//! This crate defines the domain model of the Sea UI Kit session layer:
//! tokens, users, request descriptors, loading and toast records.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod id;
pub mod notification;
pub mod request;
pub mod session;
pub mod settings;

pub use auth::{
    AuthError, AuthResponse, Credentials, TokenPayload, TokenRecord, User, expiry_reached,
    token_preview,
};
pub use error::{DomainError, DomainResult};
pub use id::generate_id;
pub use notification::{
    LoadingItem, LoadingKind, LoadingUpdate, Toast, ToastAction, ToastKind, ToastRemoval,
    ToastRequest,
};
pub use request::{ApiRequest, ApiResponse, Authorize, HttpMethod, RequestOptions};
pub use session::SessionState;
pub use settings::{ApiSettings, AuthSettings, NotificationSettings, SeaSettings};
