//! Error types for ws-session.
//!
//! One enum covers every failure a caller can observe. The variants fall
//! into three families, and the family decides what the caller may do next:
//!
//! - local validation (`UnsupportedDialect`, `CredentialsInvalid`,
//!   `InvalidParams`, `Encoding`): fix the inputs, nothing was sent.
//! - transport (`Transport`, `AmbiguousOutcome`): only `Transport` is safe
//!   to retry on the same session.
//! - remote (`RemoteFault`, `SessionExpired`): the remote side answered.
//!
//! `SessionClosed` and `SessionTainted` are raised by the handler itself
//! before anything is sent.

use std::fmt;

use crate::handler::SendResult;
use crate::session::Dialect;

/// Unified error type for all ws-session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session handler exists for the requested dialect.
    #[error("Unsupported dialect: no session handler for soap header version {0}")]
    UnsupportedDialect(Dialect),

    /// Required credential fields are missing or malformed.
    #[error("Credentials invalid: {0}")]
    CredentialsInvalid(String),

    /// Handler parameters are inconsistent.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Exchange failed before the remote side could have processed the
    /// call. Same call, same sequence number may be retried.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Exchange failed after the remote side may have processed the call.
    /// The session must be closed and a new one opened.
    #[error("Ambiguous outcome: {0}")]
    AmbiguousOutcome(String),

    /// The remote side reported the session as invalid or expired.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// The handler is closed; no exchange was attempted.
    #[error("Session closed")]
    SessionClosed,

    /// A previous call ended ambiguously; no exchange was attempted.
    #[error("Session tainted: {0}")]
    SessionTainted(String),

    /// The remote side executed the call and returned a business fault.
    /// The session stays usable and the sequence has advanced.
    #[error("Remote fault: {fault}")]
    RemoteFault {
        /// Classified fault.
        fault: Fault,
        /// Whatever the response carried alongside the fault.
        response: Box<SendResult>,
    },

    /// Encoding or XML parse failure.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl SessionError {
    /// Returns `true` if the same call may be re-issued on the same session.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Transport(_))
    }

    /// Returns `true` if the caller must start a new conversation before
    /// sending anything else.
    pub fn requires_new_session(&self) -> bool {
        matches!(
            self,
            SessionError::AmbiguousOutcome(_)
                | SessionError::SessionExpired(_)
                | SessionError::SessionClosed
                | SessionError::SessionTainted(_)
        )
    }
}

impl From<quick_xml::Error> for SessionError {
    fn from(err: quick_xml::Error) -> Self {
        SessionError::Encoding(format!("malformed xml: {err}"))
    }
}

// ── Remote faults ────────────────────────────────────────────────────

/// Fault codes that invalidate the session they were raised on.
///
/// Fault strings have the form `CODE|Category|text`. A fault whose code
/// is listed here ends the conversation even when its category is not
/// `Session`.
pub const SESSION_FAULT_CODES: [&str; 2] = [
    // Session does not exist (never started, or signed out).
    "11",
    // Inactive conversation (expired on the remote side).
    "95",
];

/// Category that marks a fault as session-terminating.
pub const SESSION_FAULT_CATEGORY: &str = "Session";

/// Returns `true` if the given code is a registered session fault code.
pub fn is_session_fault_code(code: &str) -> bool {
    SESSION_FAULT_CODES.contains(&code)
}

/// How a remote fault affects the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Semantic error; the session remains usable.
    Business,
    /// The session no longer exists on the remote side.
    SessionTerminating,
}

/// A SOAP fault returned inside a well-formed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// SOAP `faultcode` (e.g. `soap:Server`).
    pub fault_code: String,
    /// SOAP `faultstring`, verbatim.
    pub message: String,
    /// Leading code segment of the fault string, if any.
    pub code: Option<String>,
    /// Category segment of the fault string, if any.
    pub category: Option<String>,
    /// Classification.
    pub kind: FaultKind,
}

impl Fault {
    /// Classify a SOAP fault from its `faultcode` and `faultstring`.
    pub fn classify(fault_code: &str, fault_string: &str) -> Self {
        let mut parts = fault_string.trim().splitn(3, '|');
        let code = parts
            .next()
            .map(str::trim)
            .filter(|c| !c.is_empty() && c.chars().all(|ch| ch.is_ascii_digit()))
            .map(str::to_string);
        let category = match code {
            Some(_) => parts
                .next()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            None => None,
        };

        let terminating = code.as_deref().is_some_and(is_session_fault_code)
            || category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(SESSION_FAULT_CATEGORY));

        Fault {
            fault_code: fault_code.trim().to_string(),
            message: fault_string.trim().to_string(),
            code,
            category,
            kind: if terminating {
                FaultKind::SessionTerminating
            } else {
                FaultKind::Business
            },
        }
    }

    /// Returns `true` if this fault ends the session.
    pub fn is_session_terminating(&self) -> bool {
        self.kind == FaultKind::SessionTerminating
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.fault_code, self.message)
    }
}
