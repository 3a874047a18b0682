//! How an envelope reaches the remote side.
//!
//! HTTP mechanics live outside this crate. A transport only has to say
//! *how* an exchange failed, because that decides whether the session's
//! sequence number may have been consumed.

use std::fmt;
use std::time::Duration;

/// One outgoing exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// Service endpoint URL.
    pub endpoint: String,
    /// SOAP action of the operation.
    pub action: String,
    /// Serialized envelope.
    pub payload: Vec<u8>,
}

/// Why an exchange produced no response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The request provably never reached the remote side
    /// (connection refused, DNS failure, TLS handshake failure).
    NotDelivered(String),
    /// No response within the deadline. The request may have been
    /// processed.
    TimedOut(Duration),
    /// The exchange was cut off after the request left (connection reset,
    /// cancellation). The request may have been processed.
    Interrupted(String),
}

impl TransportFailure {
    /// Returns `true` if the remote side may have processed the request.
    pub fn is_ambiguous(&self) -> bool {
        !matches!(self, TransportFailure::NotDelivered(_))
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::NotDelivered(reason) => write!(f, "not delivered: {reason}"),
            TransportFailure::TimedOut(after) => write!(f, "timed out after {after:?}"),
            TransportFailure::Interrupted(reason) => write!(f, "interrupted: {reason}"),
        }
    }
}

/// Exchanges an envelope for a response.
///
/// Implementations may block. The handler holds its session lock for the
/// whole exchange, so one handler never has two exchanges in flight.
pub trait Transport: Send + Sync {
    /// Send the request and return the raw response body.
    fn exchange(&self, request: &TransportRequest) -> Result<Vec<u8>, TransportFailure>;
}
