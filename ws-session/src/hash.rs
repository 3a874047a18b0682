//! Hashing utilities — SHA-1 and SHA-256.
//!
//! SHA-1 is not a choice: the WS-Security UsernameToken profile fixes it
//! for password digests. SHA-256 is used where the choice is ours (nonce
//! derivation).

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Compute SHA-1 hash of arbitrary data.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-1 over the concatenation of several parts.
///
/// Equivalent to `sha1(&[a, b, c].concat())` without the allocation.
pub fn sha1_concat(parts: &[&[u8]]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Compute SHA-256 hash of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
