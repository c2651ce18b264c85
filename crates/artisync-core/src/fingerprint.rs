//! Content fingerprints for change detection.
//!
//! A fingerprint is the hex-encoded SHA256 of an artifact's raw source
//! bytes. Two passes over identical bytes always yield the same
//! fingerprint, which is what lets an unchanged artifact skip processing.

use sha2::{Digest, Sha256};

/// Compute the fingerprint of raw artifact content.
///
/// ## Example
///
/// ```
/// use artisync_core::fingerprint::compute_fingerprint;
///
/// let fp = compute_fingerprint(b"CREATE TABLE users (id INT)");
/// assert_eq!(fp.len(), 64);
/// ```
pub fn compute_fingerprint(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_known_value() {
        assert_eq!(
            compute_fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        assert_ne!(compute_fingerprint(b"a"), compute_fingerprint(b"b"));
        assert_eq!(compute_fingerprint(b"a"), compute_fingerprint(b"a"));
    }
}
