//! Content addresses for source locators

use sha2::{Digest, Sha256};

/// Number of digest bytes kept in a fingerprint
const FINGERPRINT_BYTES: usize = 16;

/// Length of a fingerprint in hex characters
pub const FINGERPRINT_LEN: usize = FINGERPRINT_BYTES * 2;

/// Derive the fingerprint of a locator: SHA-256, first 16 bytes, lowercase hex
pub fn fingerprint(locator: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(locator.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

/// Whether `value` has the shape of a fingerprint (safe to use as a directory name)
pub fn is_fingerprint(value: &str) -> bool {
    value.len() == FINGERPRINT_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
