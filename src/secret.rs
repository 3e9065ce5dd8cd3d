// file: src/secret.rs
// version: 1.0.0
// guid: 82a6894c-3925-45f4-a9cb-ffaba1b3805e

//! API key generation

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

/// Bytes of randomness behind every generated key
pub const API_KEY_ENTROPY_BYTES: usize = 32;

/// Name of the configuration entry that receives the key
pub const API_KEY_VAR: &str = "API_KEY";

/// Randomly generated API key, base64url without padding
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Generate a new key from the OS random source
    pub fn generate() -> Self {
        let mut bytes = [0u8; API_KEY_ENTROPY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self::from_bytes(&bytes)
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True if every character belongs to the URL-safe base64 alphabet
    pub fn is_url_safe(value: &str) -> bool {
        !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_is_url_safe_and_full_entropy() {
        let key = ApiKey::generate();
        assert!(ApiKey::is_url_safe(key.expose()));

        let decoded = URL_SAFE_NO_PAD.decode(key.expose()).unwrap();
        assert_eq!(decoded.len(), API_KEY_ENTROPY_BYTES);
        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(key.expose().len(), 43);
    }

    #[test]
    fn test_keys_differ() {
        assert_ne!(ApiKey::generate(), ApiKey::generate());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = ApiKey::from_bytes(&[0xfb; 32]);
        let debug = format!("{:?}", key);
        assert!(!debug.contains(key.expose()));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_encoding_uses_url_alphabet() {
        // 0xfb 0xff encodes to '+' and '/' in the standard alphabet
        let key = ApiKey::from_bytes(&[0xfb, 0xff, 0xbf]);
        assert_eq!(key.expose(), "-_-_");
        assert!(!ApiKey::is_url_safe("abc+/"));
        assert!(!ApiKey::is_url_safe(""));
    }
}
