//! Per-conversation session record and the dialects it can speak.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────┐  open() / first completed send  ┌──────┐
//! │ Unopened │────────────────────────────────>│ Open │──┐ send (sequence + 1)
//! └──────────┘                                 └──────┘<─┘
//!      │                                          │
//!      │ close()              close() / session fault / end_session
//!      ↓                                          ↓
//! ┌────────┐                                 ┌────────┐
//! │ Closed │                                 │ Closed │
//! └────────┘                                 └────────┘
//! ```
//!
//! Nothing leaves `Closed`.
//!
//! # Sequencing
//!
//! `sequence_number` is the number of the most recently completed
//! round-trip, 0 before the first. The next call uses
//! [`SessionState::next_sequence_number`]. The session-establishing call
//! completes as number 1.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wire dialect (SOAP header version).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// SOAP header 1. Reserved, no handler.
    V1,
    /// SOAP header 2. Reserved, no handler.
    V2,
    /// SOAP header 4.
    V4,
}

impl Dialect {
    /// Every dialect, implemented or not.
    pub const ALL: [Dialect; 3] = [Dialect::V1, Dialect::V2, Dialect::V4];

    /// Returns `true` if a session handler exists for this dialect.
    pub fn is_implemented(self) -> bool {
        matches!(self, Dialect::V4)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = match self {
            Dialect::V1 => "1",
            Dialect::V2 => "2",
            Dialect::V4 => "4",
        };
        f.write_str(version)
    }
}

/// Lifecycle status of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Nothing sent yet, no explicit open.
    Unopened,
    /// Usable.
    Open,
    /// Terminal.
    Closed,
}

/// Snapshot of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Session id issued by the remote side.
    pub session_id: Option<String>,
    /// Number of the most recently completed round-trip.
    pub sequence_number: u32,
    /// Security token issued by the remote side.
    pub security_token: Option<String>,
    /// Dialect this conversation speaks.
    pub dialect: Dialect,
    /// Lifecycle status.
    pub status: SessionStatus,
}

impl SessionState {
    /// Fresh, unopened state.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            session_id: None,
            sequence_number: 0,
            security_token: None,
            dialect,
            status: SessionStatus::Unopened,
        }
    }

    /// Returns `true` if the conversation is open.
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Returns `true` if the conversation is closed.
    pub fn is_closed(&self) -> bool {
        self.status == SessionStatus::Closed
    }

    /// Returns `true` once the remote side has issued a session id.
    pub fn is_established(&self) -> bool {
        self.session_id.is_some()
    }

    /// Sequence number the next call will carry.
    pub fn next_sequence_number(&self) -> u32 {
        self.sequence_number.saturating_add(1)
    }
}
