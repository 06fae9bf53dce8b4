//! Key/value storage backends for the token store.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;
