//! Content fingerprinting.

use sha2::{Digest, Sha256};

use crate::models::Fingerprint;

/// SHA-256 over the raw bytes. Same bytes always give the same fingerprint.
pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Fingerprint::from_hex_unchecked(hex::encode(hasher.finalize()))
}
