//! Authentication domain types

mod types;

pub use types::{
    AuthError, AuthResponse, Credentials, TokenPayload, TokenRecord, User, expiry_reached,
    token_preview,
};
