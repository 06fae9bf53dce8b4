//! Base64 token codec.
//!
//! Obfuscation only: it keeps tokens out of casual sight in the storage
//! file, it does not protect them from anyone who can read that file.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sea_application::ports::{CodecError, TokenCodec};

/// Standard-alphabet base64 encoding of the UTF-8 token.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64TokenCodec;

impl TokenCodec for Base64TokenCodec {
    fn encode(&self, token: &str) -> String {
        STANDARD.encode(token.as_bytes())
    }

    fn decode(&self, stored: &str) -> Result<String, CodecError> {
        let bytes = STANDARD
            .decode(stored.trim())
            .map_err(|e| CodecError(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| CodecError(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encoded_value_hides_token() {
        let codec = Base64TokenCodec;
        let stored = codec.encode("eyJhbGciOiJIUzI1NiJ9.payload");
        assert!(!stored.contains("payload"));
        assert_eq!(codec.decode(&stored).unwrap(), "eyJhbGciOiJIUzI1NiJ9.payload");
    }

    #[test]
    fn test_garbage_is_rejected() {
        let codec = Base64TokenCodec;
        assert!(codec.decode("%%% not base64 %%%").is_err());
        // Valid base64, invalid UTF-8.
        assert!(codec.decode("//79").is_err());
    }
}
