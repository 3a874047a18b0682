//! Nonce generation — nonce base and per-call nonces.
//!
//! A [`NonceBase`] is a process-level string that seeds nonce derivation.
//! It is read from a file once when the factory is built, or generated
//! once per factory when no file is available. It is never ambient global
//! state: the factory holds it and passes a clone into every handler.
//!
//! ## Algorithm
//! ```text
//! nonce = SHA-256(base || counter_be64 || random_u64_be)[..16]
//! ```
//! The counter makes nonces from one source distinct by construction; the
//! random word keeps two sources with the same base apart.
//!
//! The nonce base is generated by rejection sampling from a 62-character
//! alphanumeric alphabet. `REJECTION_MAX = floor(256 / 62) * 62 = 248`.
//! Bytes >= 248 are discarded to eliminate modulo bias.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand_core::{OsRng, RngCore};

use crate::constants::{NONCE_BASE_ALPHABET, NONCE_BASE_LENGTH, NONCE_LENGTH};
use crate::encoding::{to_base64, to_hex};
use crate::hash::sha256;

const REJECTION_MAX: u8 = 248;

/// Generate a random alphanumeric string of the given length.
///
/// Uses the OS CSPRNG with rejection sampling.
pub fn generate_random_string(length: usize) -> String {
    let alphabet = NONCE_BASE_ALPHABET.as_bytes();
    let mut out = String::with_capacity(length);
    let mut buf = [0u8; 32];
    while out.len() < length {
        OsRng.fill_bytes(&mut buf);
        for &byte in buf.iter().filter(|&&b| b < REJECTION_MAX) {
            if out.len() == length {
                break;
            }
            out.push(alphabet[(byte as usize) % alphabet.len()] as char);
        }
    }
    out
}

/// Shared seed for nonce derivation.
///
/// Cheap to clone; clones share the same string.
#[derive(Clone, PartialEq, Eq)]
pub struct NonceBase(Arc<str>);

impl NonceBase {
    /// Wrap an explicit value.
    pub fn new(value: impl AsRef<str>) -> Self {
        NonceBase(Arc::from(value.as_ref()))
    }

    /// Generate a fresh ephemeral base.
    pub fn ephemeral() -> Self {
        NonceBase::new(generate_random_string(NONCE_BASE_LENGTH))
    }

    /// Read a persisted base.
    ///
    /// Returns `None` when the file is absent, unreadable, or holds only
    /// whitespace. The file is a single opaque value; surrounding
    /// whitespace is trimmed.
    pub fn load(path: &Path) -> Option<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    tracing::warn!(path = %path.display(), "nonce base file is empty");
                    None
                } else {
                    Some(NonceBase::new(trimmed))
                }
            }
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "nonce base file not readable");
                None
            }
        }
    }

    /// The base value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short hex fingerprint, safe to log in place of the value.
    pub fn fingerprint(&self) -> String {
        to_hex(&sha256(self.0.as_bytes())[..4])
    }
}

impl fmt::Debug for NonceBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NonceBase(<{} chars>)", self.0.chars().count())
    }
}

/// A per-call nonce (raw bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_LENGTH]);

impl Nonce {
    /// Wrap raw bytes. Used to pin the nonce in tests.
    pub fn from_bytes(bytes: [u8; NONCE_LENGTH]) -> Self {
        Nonce(bytes)
    }

    /// Raw nonce bytes, as fed into the digest.
    pub fn as_bytes(&self) -> &[u8; NONCE_LENGTH] {
        &self.0
    }

    /// Base64 form, as sent on the wire.
    pub fn to_base64(&self) -> String {
        to_base64(&self.0)
    }
}

/// Produces a fresh nonce on every call.
///
/// One source belongs to one handler. `next` takes `&self` so the source
/// can sit next to the handler's lock rather than inside it.
#[derive(Debug)]
pub struct NonceSource {
    base: NonceBase,
    counter: AtomicU64,
}

impl NonceSource {
    /// Source seeded by the given base.
    pub fn new(base: NonceBase) -> Self {
        Self {
            base,
            counter: AtomicU64::new(0),
        }
    }

    /// The seeding base.
    pub fn base(&self) -> &NonceBase {
        &self.base
    }

    /// Next nonce.
    pub fn next(&self) -> Nonce {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        let entropy = OsRng.next_u64();

        let base = self.base.as_str().as_bytes();
        let mut input = Vec::with_capacity(base.len() + 16);
        input.extend_from_slice(base);
        input.extend_from_slice(&count.to_be_bytes());
        input.extend_from_slice(&entropy.to_be_bytes());

        let digest = sha256(&input);
        let mut raw = [0u8; NONCE_LENGTH];
        raw.copy_from_slice(&digest[..NONCE_LENGTH]);
        Nonce(raw)
    }
}
