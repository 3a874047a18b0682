//! ws-session — session handler core for SOAP travel web services.
//!
//! Callers hand this crate an operation body; it picks the handler for
//! the requested header dialect, authenticates the envelope, exchanges it
//! through a caller-supplied transport, and keeps the conversation's
//! session id, security token and sequence number consistent across
//! calls.
//!
//! # Module Map
//!
//! | Module | Concern |
//! |--------|---------|
//! | [`constants`] | Namespaces, defaults, fixed lengths |
//! | [`errors`] | `SessionError`, fault classification |
//! | [`encoding`] | base64 and hex |
//! | [`hash`] | SHA-1 (digest) and SHA-256 (nonce) |
//! | [`clock`] | Injected time source |
//! | [`credentials`] | Office/user identity and password material |
//! | [`nonce`] | Nonce base and per-call nonces |
//! | [`security`] | WS-Security UsernameToken header |
//! | [`session`] | Dialects and the per-conversation record |
//! | [`envelope`] | Request rendering, response parsing |
//! | [`transport`] | Transport seam |
//! | [`converter`] | Operation bodies, converter seam |
//! | [`handler`] | Dialect handlers (the state machine) |
//! | [`factory`] | Dialect dispatch, nonce-base resolution |
//! | [`config`] | Factory configuration |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ws_session::config::FactoryConfig;
//! use ws_session::converter::OperationBody;
//! use ws_session::credentials::{Credentials, Password};
//! use ws_session::factory::{HandlerFactory, SessionHandlerParams};
//! use ws_session::session::Dialect;
//! use ws_session::transport::{Transport, TransportFailure, TransportRequest};
//!
//! struct Http;
//! impl Transport for Http {
//!     fn exchange(&self, _req: &TransportRequest) -> Result<Vec<u8>, TransportFailure> {
//!         unimplemented!()
//!     }
//! }
//!
//! let factory = HandlerFactory::new(&FactoryConfig::default());
//! let credentials = Arc::new(Credentials::new("BRUXX0000", "WSBENXXX", Password::clear("secret")));
//! let params = SessionHandlerParams::new(
//!     Dialect::V4,
//!     credentials,
//!     "https://nodeD1.test.webservices.amadeus.com/1ASIWXXXXXX",
//!     Arc::new(Http),
//! );
//! let handler = factory.create_handler(params)?;
//! let body = OperationBody::new(
//!     "http://webservices.amadeus.com/PNRRET_11_3_1A",
//!     "<PNR_Retrieve/>",
//! );
//! let reply = handler.send("PNR_Retrieve", &body)?;
//! println!("session {:?} at {}", reply.session_id, reply.sequence_number);
//! handler.close()?;
//! # Ok::<(), ws_session::errors::SessionError>(())
//! ```

/// Protocol constants.
pub mod constants;

/// Error types and fault classification.
pub mod errors;

/// Encoding utilities — base64 and hex.
pub mod encoding;

/// Hashing utilities — SHA-1 and SHA-256.
pub mod hash;

/// Injected time source.
pub mod clock;

/// Credentials and password material.
pub mod credentials;

/// Nonce base and per-call nonces.
pub mod nonce;

/// WS-Security header construction.
pub mod security;

/// Dialects and session state.
pub mod session;

/// SOAP envelope rendering and parsing.
pub mod envelope;

/// Transport seam.
pub mod transport;

/// Operation bodies and the converter seam.
pub mod converter;

/// Dialect handlers.
pub mod handler;

/// Handler factory.
pub mod factory;

/// Factory configuration.
pub mod config;

pub use errors::SessionError;
pub use factory::{create_handler, HandlerFactory, SessionHandlerParams};
pub use handler::{Handler, SendOptions, SendResult};
pub use session::{Dialect, SessionState, SessionStatus};
