//! Session handler for SOAP header 4.
//!
//! # Per-call algorithm
//!
//! 1. Refuse if closed or tainted (no exchange).
//! 2. Draw a nonce, build the auth header from the session snapshot.
//! 3. Render the envelope. The session-establishing call carries
//!    credentials and `TransactionStatusCode="Start"` without a session id;
//!    later calls carry session id, next sequence number and security token.
//! 4. Exchange through the transport (the only blocking point).
//! 5. Classify the outcome:
//!    - not delivered: `Transport`, state untouched, retry is safe.
//!    - timed out / interrupted / malformed / uncorrelated reply:
//!      `AmbiguousOutcome`, session tainted.
//!    - session fault: `SessionExpired`, session closed.
//!    - business fault: sequence advances, `RemoteFault`.
//!    - success: tokens captured, sequence advances.
//!
//! The conversation lock is held across all five steps, so one handler
//! never has two exchanges in flight and readers never observe a
//! half-applied response.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::constants::{SIGN_OUT_ACTION, SIGN_OUT_NAMESPACE, SIGN_OUT_OPERATION};
use crate::converter::{OperationBody, RequestConverter};
use crate::credentials::Credentials;
use crate::envelope::{RequestEnvelope, ResponseEnvelope, SessionHeader, TransactionStatus};
use crate::errors::SessionError;
use crate::handler::{SendOptions, SendResult};
use crate::nonce::{NonceBase, NonceSource};
use crate::security::SecurityHeaderBuilder;
use crate::session::{Dialect, SessionState, SessionStatus};
use crate::transport::{Transport, TransportRequest};

/// Everything a header 4 handler is built from.
pub(crate) struct HandlerParts {
    pub credentials: Arc<Credentials>,
    pub nonce_base: NonceBase,
    pub transport: Arc<dyn Transport>,
    pub clock: Arc<dyn Clock>,
    pub endpoint: String,
    pub stateful: bool,
    pub state: SessionState,
}

#[derive(Debug)]
struct Conversation {
    state: SessionState,
    tainted: Option<String>,
}

/// What one call puts on the wire and what it does to the session.
#[derive(Debug)]
struct CallPlan {
    session: Option<SessionHeader>,
    authenticate: bool,
    sequence: u32,
    closes: bool,
}

/// Session handler for SOAP header 4.
pub struct HeaderV4Handler {
    conversation: Mutex<Conversation>,
    credentials: Arc<Credentials>,
    nonces: NonceSource,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    endpoint: String,
    stateful: bool,
}

impl fmt::Debug for HeaderV4Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderV4Handler")
            .field("endpoint", &self.endpoint)
            .field("stateful", &self.stateful)
            .field("office_id", &self.credentials.office_id)
            .finish_non_exhaustive()
    }
}

impl HeaderV4Handler {
    pub(crate) fn new(parts: HandlerParts) -> Self {
        Self {
            conversation: Mutex::new(Conversation {
                state: parts.state,
                tainted: None,
            }),
            credentials: parts.credentials,
            nonces: NonceSource::new(parts.nonce_base),
            transport: parts.transport,
            clock: parts.clock,
            endpoint: parts.endpoint,
            stateful: parts.stateful,
        }
    }

    /// Returns `true` if this handler keeps a remote session.
    pub fn is_stateful(&self) -> bool {
        self.stateful
    }

    /// Read-only snapshot of the session.
    pub fn current_state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Why the session is tainted, if it is.
    pub fn taint_reason(&self) -> Option<String> {
        self.lock().tainted.clone()
    }

    /// Base this handler derives its nonces from.
    pub fn nonce_base(&self) -> &NonceBase {
        self.nonces.base()
    }

    /// Open the conversation. Idempotent while open.
    ///
    /// # Errors
    /// Returns `SessionError::SessionClosed` if the handler is closed.
    pub fn open(&self) -> Result<(), SessionError> {
        let mut conv = self.lock();
        match conv.state.status {
            SessionStatus::Open => {
                debug!("open: already open");
                Ok(())
            }
            SessionStatus::Closed => Err(SessionError::SessionClosed),
            SessionStatus::Unopened => {
                conv.state = SessionState {
                    status: SessionStatus::Open,
                    ..SessionState::new(Dialect::V4)
                };
                info!(stateful = self.stateful, "conversation opened");
                Ok(())
            }
        }
    }

    /// Close the conversation.
    ///
    /// An established stateful session is signed out first, unless it is
    /// tainted: its next sequence number may already have been consumed by
    /// the ambiguous call, so nothing more is sent on it. The handler is
    /// `Closed` when this returns, whether or not the sign-out succeeded;
    /// a failed sign-out is returned so the caller can log it.
    ///
    /// # Errors
    /// Returns the sign-out failure, if any.
    pub fn close(&self) -> Result<(), SessionError> {
        let mut conv = self.lock();
        if conv.state.is_closed() {
            return Ok(());
        }

        let mut outcome = Ok(());
        if let Some(reason) = conv.tainted.clone() {
            // The next sequence number may already be consumed remotely.
            warn!(%reason, "session tainted, closing without sign-out");
        } else if self.stateful && conv.state.is_established() {
            let body = OperationBody::new(
                SIGN_OUT_ACTION,
                format!(r#"<{SIGN_OUT_OPERATION} xmlns="{SIGN_OUT_NAMESPACE}"/>"#),
            );
            if let Err(err) = self.round_trip(&mut conv, SIGN_OUT_OPERATION, &body, true) {
                warn!(error = %err, "sign-out failed, closing anyway");
                outcome = Err(err);
            }
        }

        conv.state.status = SessionStatus::Closed;
        info!(
            session_id = conv.state.session_id.as_deref().unwrap_or("-"),
            sequence = conv.state.sequence_number,
            "conversation closed"
        );
        outcome
    }

    /// Send an operation.
    ///
    /// # Errors
    /// See [`SessionError`]; every variant except `UnsupportedDialect` and
    /// `InvalidParams` can surface here.
    pub fn send(&self, operation: &str, body: &OperationBody) -> Result<SendResult, SessionError> {
        self.send_with_options(operation, body, &SendOptions::default())
    }

    /// Convert options with `converter` and send the result.
    ///
    /// # Errors
    /// Same as [`HeaderV4Handler::send`].
    pub fn send_request<C: RequestConverter>(
        &self,
        converter: &C,
        operation: &str,
        options: &C::Options,
    ) -> Result<SendResult, SessionError> {
        let body = converter.convert(options, Dialect::V4);
        self.send(operation, &body)
    }

    /// Send an operation with per-call options.
    ///
    /// # Errors
    /// Same as [`HeaderV4Handler::send`].
    #[tracing::instrument(level = "debug", skip(self, body, options))]
    pub fn send_with_options(
        &self,
        operation: &str,
        body: &OperationBody,
        options: &SendOptions,
    ) -> Result<SendResult, SessionError> {
        let mut conv = self.lock();
        if conv.state.is_closed() {
            return Err(SessionError::SessionClosed);
        }
        if let Some(reason) = &conv.tainted {
            return Err(SessionError::SessionTainted(reason.clone()));
        }
        self.round_trip(&mut conv, operation, body, options.end_session)
    }

    fn lock(&self) -> MutexGuard<'_, Conversation> {
        match self.conversation.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                let mut guard = poisoned.into_inner();
                if guard.tainted.is_none() && !guard.state.is_closed() {
                    warn!("session lock poisoned by a panicking call, tainting session");
                    guard.tainted = Some("a previous call panicked mid-exchange".into());
                }
                self.conversation.clear_poison();
                guard
            }
        }
    }

    fn plan(&self, state: &SessionState, end_session: bool) -> CallPlan {
        let sequence = state.next_sequence_number();
        if !self.stateful || (!state.is_established() && end_session) {
            return CallPlan {
                session: None,
                authenticate: true,
                sequence,
                closes: end_session,
            };
        }
        if !state.is_established() {
            return CallPlan {
                session: Some(SessionHeader::start()),
                authenticate: true,
                sequence,
                closes: false,
            };
        }
        CallPlan {
            session: Some(SessionHeader {
                status: if end_session {
                    TransactionStatus::End
                } else {
                    TransactionStatus::InSeries
                },
                session_id: state.session_id.clone(),
                sequence_number: Some(sequence),
                security_token: state.security_token.clone(),
            }),
            authenticate: false,
            sequence,
            closes: end_session,
        }
    }

    fn round_trip(
        &self,
        conv: &mut Conversation,
        operation: &str,
        body: &OperationBody,
        end_session: bool,
    ) -> Result<SendResult, SessionError> {
        let plan = self.plan(&conv.state, end_session);
        let auth = SecurityHeaderBuilder::build(
            &self.credentials,
            self.nonces.next(),
            self.clock.now(),
            &conv.state,
        )?;

        let message_id = format!("urn:uuid:{}", Uuid::new_v4());
        let status = plan.session.as_ref().map(|s| s.status);
        let envelope = RequestEnvelope {
            message_id: message_id.clone(),
            action: body.action.clone(),
            endpoint: self.endpoint.clone(),
            security: plan.authenticate.then_some(auth),
            session: plan.session.clone(),
            body_xml: body.xml.clone(),
        };
        let request = TransportRequest {
            endpoint: self.endpoint.clone(),
            action: body.action.clone(),
            payload: envelope.to_xml().into_bytes(),
        };

        debug!(
            operation,
            sequence = plan.sequence,
            status = ?status,
            authenticate = plan.authenticate,
            "exchanging"
        );

        let raw = match self.transport.exchange(&request) {
            Ok(raw) => raw,
            Err(failure) if failure.is_ambiguous() => {
                return Err(taint(conv, format!("{operation}: {failure}")));
            }
            Err(failure) => {
                debug!(operation, %failure, "request not delivered, session untouched");
                return Err(SessionError::Transport(format!("{operation}: {failure}")));
            }
        };

        let response = match ResponseEnvelope::parse(&raw) {
            Ok(response) => response,
            Err(err) => {
                return Err(taint(conv, format!("{operation}: malformed response: {err}")));
            }
        };
        if let Some(relates_to) = response.relates_to.as_deref() {
            if relates_to != message_id {
                return Err(taint(
                    conv,
                    format!("{operation}: reply relates to {relates_to}, expected {message_id}"),
                ));
            }
        }

        if let Some(fault) = &response.fault {
            if fault.is_session_terminating() {
                warn!(operation, %fault, "session rejected by remote side, closing");
                conv.state.status = SessionStatus::Closed;
                return Err(SessionError::SessionExpired(fault.to_string()));
            }
        }

        self.apply_response(conv, &plan, &response, operation)?;
        if plan.closes {
            conv.state.status = SessionStatus::Closed;
            info!(operation, "conversation ended by call");
        }

        let result = SendResult {
            operation: operation.to_string(),
            message_id,
            sequence_number: conv.state.sequence_number,
            session_id: conv.state.session_id.clone(),
            body_xml: response.body_xml,
        };

        match response.fault {
            Some(fault) => {
                debug!(operation, %fault, "business fault");
                Err(SessionError::RemoteFault {
                    fault,
                    response: Box::new(result),
                })
            }
            None => Ok(result),
        }
    }

    /// Fold a parsed, correlated, non-terminating response into the state.
    fn apply_response(
        &self,
        conv: &mut Conversation,
        plan: &CallPlan,
        response: &ResponseEnvelope,
        operation: &str,
    ) -> Result<(), SessionError> {
        let faulted = response.fault.is_some();

        let Some(sent) = &plan.session else {
            conv.state.sequence_number = plan.sequence;
            conv.state.status = SessionStatus::Open;
            return Ok(());
        };

        let received = response.session.as_ref();
        if let Some(seq) = received.and_then(|s| s.sequence_number) {
            if seq != plan.sequence {
                return Err(taint(
                    conv,
                    format!(
                        "{operation}: reply sequence number {seq}, expected {}",
                        plan.sequence
                    ),
                ));
            }
        }

        if sent.status == TransactionStatus::Start {
            match received.and_then(|s| s.session_id.clone()) {
                Some(session_id) => {
                    info!(%session_id, "session established");
                    conv.state.session_id = Some(session_id);
                }
                None if faulted => {
                    debug!(operation, "session-establishing call faulted, no session opened");
                    return Ok(());
                }
                None => {
                    return Err(taint(
                        conv,
                        format!("{operation}: reply to session-establishing call has no session id"),
                    ));
                }
            }
        } else if let Some(session_id) = received.and_then(|s| s.session_id.clone()) {
            conv.state.session_id = Some(session_id);
        }

        if let Some(token) = received.and_then(|s| s.security_token.clone()) {
            conv.state.security_token = Some(token);
        }
        conv.state.sequence_number = plan.sequence;
        conv.state.status = SessionStatus::Open;
        Ok(())
    }
}

fn taint(conv: &mut Conversation, reason: String) -> SessionError {
    warn!(
        session_id = conv.state.session_id.as_deref().unwrap_or("-"),
        sequence = conv.state.sequence_number,
        %reason,
        "ambiguous outcome, session tainted"
    );
    conv.tainted = Some(reason.clone());
    SessionError::AmbiguousOutcome(reason)
}
