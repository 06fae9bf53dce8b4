//! Token codec port
//!
//! Tokens are encoded before they reach storage. The codec decides how
//! strong that encoding is; decode failures mean the stored value is
//! corrupt and the token store fails closed.

use thiserror::Error;

/// A stored token could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stored token could not be decoded: {0}")]
pub struct CodecError(pub String);

/// Reversible encoding applied to tokens at rest.
pub trait TokenCodec: Send + Sync {
    /// Encodes a token for storage.
    fn encode(&self, token: &str) -> String;

    /// Decodes a stored token.
    ///
    /// # Errors
    /// Returns `CodecError` if `stored` was not produced by `encode`.
    fn decode(&self, stored: &str) -> Result<String, CodecError>;
}
