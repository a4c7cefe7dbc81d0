use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;

/// Entropy of the random part of stored object and asset names.
pub const STORAGE_KEY_BYTES: usize = 32;

/// Upper bound accepted by [`generate_key`].
pub const MAX_KEY_BYTES: usize = 64;

/// Returns `length` bytes from the OS CSPRNG as unpadded URL-safe base64.
///
/// The length is clamped to `1..=MAX_KEY_BYTES`. The output only contains
/// `[A-Za-z0-9_-]` and can be used verbatim as a path or URL segment.
/// Panics if the OS random source is unavailable.
pub fn generate_key(length: usize) -> String {
    let mut bytes = vec![0u8; length.clamp(1, MAX_KEY_BYTES)];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_key_length() {
        // 32 bytes -> ceil(32 * 4 / 3) characters without padding
        assert_eq!(generate_key(STORAGE_KEY_BYTES).len(), 43);
        assert_eq!(generate_key(3).len(), 4);
    }

    #[test]
    fn test_generate_key_is_url_safe() {
        for _ in 0..200 {
            let key = generate_key(STORAGE_KEY_BYTES);
            assert!(
                key.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
                "unexpected character in {}",
                key
            );
        }
    }

    #[test]
    fn test_generate_key_uniqueness() {
        let keys: HashSet<String> = (0..10_000)
            .map(|_| generate_key(STORAGE_KEY_BYTES))
            .collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn test_generate_key_clamps_length() {
        assert!(!generate_key(0).is_empty());
        assert_eq!(generate_key(1000).len(), generate_key(MAX_KEY_BYTES).len());
    }
}
