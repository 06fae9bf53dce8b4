//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session layer and its
//! collaborators. Each port is a trait implemented by adapters in the
//! infrastructure layer (or by test doubles).

mod auth_api;
mod clock;
mod session_store;
mod storage;
mod token_codec;
mod transport;

pub use auth_api::AuthApi;
pub use clock::Clock;
pub use session_store::SessionStore;
pub use storage::{KeyValueStorage, StorageError};
pub use token_codec::{CodecError, TokenCodec};
pub use transport::Transport;
