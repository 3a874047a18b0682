//! Protocol handlers, one per implemented dialect.
//!
//! [`Handler`] is a closed set: adding a dialect means adding a variant
//! here and a branch in the factory. Reserved dialects have no variant;
//! the factory rejects them with `SessionError::UnsupportedDialect`.

pub mod header_v4;

use crate::converter::{OperationBody, RequestConverter};
use crate::errors::SessionError;
use crate::nonce::NonceBase;
use crate::session::{Dialect, SessionState};

pub use header_v4::HeaderV4Handler;

/// Per-call options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// End the conversation with this call.
    pub end_session: bool,
}

impl SendOptions {
    /// Options that end the conversation with the call.
    pub fn end_session() -> Self {
        Self { end_session: true }
    }
}

/// A completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    /// Operation name, as passed to `send`.
    pub operation: String,
    /// WS-Addressing MessageID of the request.
    pub message_id: String,
    /// Sequence number the session is at after the call.
    pub sequence_number: u32,
    /// Session id after the call.
    pub session_id: Option<String>,
    /// Raw inner XML of the response Body.
    pub body_xml: String,
}

/// A session handler for one conversation.
#[derive(Debug)]
pub enum Handler {
    /// SOAP header 4.
    HeaderV4(HeaderV4Handler),
}

impl Handler {
    /// Dialect this handler speaks.
    pub fn dialect(&self) -> Dialect {
        match self {
            Handler::HeaderV4(_) => Dialect::V4,
        }
    }

    /// Send an operation.
    ///
    /// # Errors
    /// See [`HeaderV4Handler::send`].
    pub fn send(&self, operation: &str, body: &OperationBody) -> Result<SendResult, SessionError> {
        match self {
            Handler::HeaderV4(h) => h.send(operation, body),
        }
    }

    /// Send an operation with per-call options.
    ///
    /// # Errors
    /// See [`HeaderV4Handler::send`].
    pub fn send_with_options(
        &self,
        operation: &str,
        body: &OperationBody,
        options: &SendOptions,
    ) -> Result<SendResult, SessionError> {
        match self {
            Handler::HeaderV4(h) => h.send_with_options(operation, body, options),
        }
    }

    /// Convert options with `converter` and send the result.
    ///
    /// # Errors
    /// See [`HeaderV4Handler::send`].
    pub fn send_request<C: RequestConverter>(
        &self,
        converter: &C,
        operation: &str,
        options: &C::Options,
    ) -> Result<SendResult, SessionError> {
        match self {
            Handler::HeaderV4(h) => h.send_request(converter, operation, options),
        }
    }

    /// Open the conversation.
    ///
    /// # Errors
    /// Returns `SessionError::SessionClosed` if the handler is closed.
    pub fn open(&self) -> Result<(), SessionError> {
        match self {
            Handler::HeaderV4(h) => h.open(),
        }
    }

    /// Close the conversation. The handler is closed afterwards either way.
    ///
    /// # Errors
    /// Returns the sign-out failure, if any.
    pub fn close(&self) -> Result<(), SessionError> {
        match self {
            Handler::HeaderV4(h) => h.close(),
        }
    }

    /// Read-only snapshot of the session.
    pub fn current_state(&self) -> SessionState {
        match self {
            Handler::HeaderV4(h) => h.current_state(),
        }
    }

    /// Why the session is tainted, if it is.
    pub fn taint_reason(&self) -> Option<String> {
        match self {
            Handler::HeaderV4(h) => h.taint_reason(),
        }
    }

    /// Base this handler derives its nonces from.
    pub fn nonce_base(&self) -> &NonceBase {
        match self {
            Handler::HeaderV4(h) => h.nonce_base(),
        }
    }
}
