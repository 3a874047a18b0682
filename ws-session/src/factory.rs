//! Handler factory — dialect dispatch and nonce-base resolution.
//!
//! The nonce base is resolved once, when the factory is built: the
//! configured file if it is readable and non-empty, otherwise a fresh
//! ephemeral base kept for the factory's lifetime. An explicit base in
//! the handler params wins over both and is never overwritten.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::FactoryConfig;
use crate::credentials::Credentials;
use crate::errors::SessionError;
use crate::handler::header_v4::{HandlerParts, HeaderV4Handler};
use crate::handler::Handler;
use crate::nonce::NonceBase;
use crate::session::{Dialect, SessionState};
use crate::transport::Transport;

/// Inputs for one handler.
pub struct SessionHandlerParams {
    /// Requested dialect.
    pub dialect: Dialect,
    /// Credentials, shared read-only.
    pub credentials: Arc<Credentials>,
    /// Service endpoint.
    pub endpoint: String,
    /// Transport to exchange envelopes through.
    pub transport: Arc<dyn Transport>,
    /// Keep a remote session across calls (default `true`).
    pub stateful: bool,
    /// Explicit nonce base; overrides the factory's.
    pub nonce_base: Option<NonceBase>,
    /// Conversation to resume.
    pub resume: Option<SessionState>,
}

impl SessionHandlerParams {
    /// Stateful params with no explicit nonce base and no resumed state.
    pub fn new(
        dialect: Dialect,
        credentials: Arc<Credentials>,
        endpoint: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            dialect,
            credentials,
            endpoint: endpoint.into(),
            transport,
            stateful: true,
            nonce_base: None,
            resume: None,
        }
    }

    /// Set stateful or stateless operation.
    pub fn stateful(mut self, stateful: bool) -> Self {
        self.stateful = stateful;
        self
    }

    /// Use an explicit nonce base.
    pub fn nonce_base(mut self, base: NonceBase) -> Self {
        self.nonce_base = Some(base);
        self
    }

    /// Resume an existing conversation.
    pub fn resume(mut self, state: SessionState) -> Self {
        self.resume = Some(state);
        self
    }

    fn validate(&self) -> Result<(), SessionError> {
        self.credentials.validate()?;
        if self.endpoint.trim().is_empty() {
            return Err(SessionError::InvalidParams("endpoint is empty".into()));
        }
        if let Some(state) = &self.resume {
            if state.dialect != self.dialect {
                return Err(SessionError::InvalidParams(format!(
                    "resumed session speaks soap header version {}, requested {}",
                    state.dialect, self.dialect
                )));
            }
        }
        Ok(())
    }
}

/// Creates session handlers.
#[derive(Debug, Clone)]
pub struct HandlerFactory {
    nonce_base: NonceBase,
    clock: Arc<dyn Clock>,
}

impl HandlerFactory {
    /// Build a factory, resolving the nonce base.
    pub fn new(config: &FactoryConfig) -> Self {
        let persisted = config.nonce_base_path.as_deref().and_then(|path| {
            let base = NonceBase::load(path);
            if base.is_none() {
                warn!(
                    path = %path.display(),
                    "nonce base file unavailable, falling back to an ephemeral base"
                );
            }
            base
        });
        let nonce_base = persisted.unwrap_or_else(|| {
            debug!("generating ephemeral nonce base");
            NonceBase::ephemeral()
        });
        debug!(fingerprint = %nonce_base.fingerprint(), "nonce base resolved");
        Self {
            nonce_base,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock handed to new handlers.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Nonce base handed to handlers without an explicit one.
    pub fn nonce_base(&self) -> &NonceBase {
        &self.nonce_base
    }

    /// Create the handler for `params.dialect`.
    ///
    /// # Errors
    /// - `SessionError::UnsupportedDialect` for reserved dialects.
    /// - `SessionError::CredentialsInvalid` for incomplete credentials.
    /// - `SessionError::InvalidParams` for an empty endpoint or a resumed
    ///   state of another dialect.
    pub fn create_handler(&self, params: SessionHandlerParams) -> Result<Handler, SessionError> {
        if !params.dialect.is_implemented() {
            return Err(SessionError::UnsupportedDialect(params.dialect));
        }
        params.validate()?;

        let nonce_base = params
            .nonce_base
            .unwrap_or_else(|| self.nonce_base.clone());
        let state = params
            .resume
            .unwrap_or_else(|| SessionState::new(params.dialect));

        let handler = match params.dialect {
            Dialect::V4 => Handler::HeaderV4(HeaderV4Handler::new(HandlerParts {
                credentials: params.credentials,
                nonce_base,
                transport: params.transport,
                clock: self.clock.clone(),
                endpoint: params.endpoint,
                stateful: params.stateful,
                state,
            })),
            Dialect::V1 | Dialect::V2 => {
                return Err(SessionError::UnsupportedDialect(params.dialect));
            }
        };

        info!(
            dialect = %handler.dialect(),
            stateful = params.stateful,
            "session handler created"
        );
        Ok(handler)
    }
}

/// Create a handler with a factory built from the default configuration.
///
/// # Errors
/// Same as [`HandlerFactory::create_handler`].
pub fn create_handler(params: SessionHandlerParams) -> Result<Handler, SessionError> {
    HandlerFactory::new(&FactoryConfig::default()).create_handler(params)
}
