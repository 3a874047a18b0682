//! Encoding utilities — base64 and hex.
//!
//! Nonces and password digests travel base64-encoded (standard alphabet,
//! padded) inside the WS-Security header. Hex is only used for
//! fingerprints in log fields.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::SessionError;

/// Encode bytes to standard base64 (RFC 4648, with padding).
pub fn to_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode standard base64 to bytes.
///
/// # Errors
/// Returns `SessionError::Encoding` on invalid base64 input.
pub fn from_base64(encoded: &str) -> Result<Vec<u8>, SessionError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| SessionError::Encoding(format!("invalid base64: {e}")))
}

/// Encode bytes to lowercase hex string.
pub fn to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}
