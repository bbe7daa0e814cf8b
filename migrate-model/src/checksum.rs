//! Content checksums for exported entity files.
//!
//! Every card/dashboard payload written to disk is paired with a SHA-256
//! checksum recorded in the manifest; the loader re-hashes the file at
//! import time and refuses to proceed on a mismatch (spec invariant:
//! "checksum round-trip").

use sha2::{Digest, Sha256};

/// Compute the checksum of raw file bytes, as a lowercase hex string.
pub fn checksum_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Compute the checksum of a JSON value the way it will be written to
/// disk (pretty-printed with a trailing newline), so the checksum
/// recorded in the manifest matches what [`checksum_bytes`] will
/// recompute after reading the file back.
pub fn checksum_json(value: &serde_json::Value) -> serde_json::Result<String> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(checksum_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checksum_is_stable_for_equal_content() {
        let a = checksum_bytes(b"hello world");
        let b = checksum_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn checksum_differs_for_different_content() {
        let a = checksum_bytes(b"hello");
        let b = checksum_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn checksum_json_round_trips_through_bytes() {
        let value = json!({"id": 1, "name": "Orders"});
        let checksum = checksum_json(&value).unwrap();
        let mut bytes = serde_json::to_vec_pretty(&value).unwrap();
        bytes.push(b'\n');
        assert_eq!(checksum, checksum_bytes(&bytes));
    }
}
