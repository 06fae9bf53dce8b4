//! Adapters for the small application ports.

mod base64_codec;
mod system_clock;

pub use base64_codec::Base64TokenCodec;
pub use system_clock::SystemClock;
