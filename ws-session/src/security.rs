//! Security header — WS-Security UsernameToken with password digest.
//!
//! ## Algorithm
//! ```text
//! Created = UTC timestamp, "YYYY-MM-DDTHH:MM:SS.mmmZ"
//! Digest  = Base64(SHA1(nonce_raw || Created || SHA1(password)))
//! ```
//!
//! The builder is pure: identical credentials, nonce and timestamp give an
//! identical header. Freshness comes from the caller passing a new nonce
//! and the current time on every call.

use chrono::{DateTime, Utc};

use crate::constants::CREATED_FORMAT;
use crate::credentials::Credentials;
use crate::encoding::to_base64;
use crate::errors::SessionError;
use crate::hash::sha1_concat;
use crate::nonce::Nonce;
use crate::session::SessionState;

/// Call-scoped authentication header. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader {
    /// WS-Security username.
    pub username: String,
    /// Nonce used for this call.
    pub nonce: Nonce,
    /// `Created` timestamp string, exactly as hashed.
    pub created: String,
    /// Raw SHA-1 password digest.
    pub digest: [u8; 20],
    /// Office the hosted user signs into.
    pub office_id: String,
    /// Requestor type of the hosted user.
    pub originator_id: String,
    /// Agent duty code of the hosted user.
    pub duty_code: String,
    /// Organization, if any.
    pub organization_id: Option<String>,
    /// Session id from the session snapshot.
    pub session_id: Option<String>,
    /// Security token from the session snapshot.
    pub security_token: Option<String>,
}

impl AuthHeader {
    /// Base64 nonce, as sent on the wire.
    pub fn nonce_base64(&self) -> String {
        self.nonce.to_base64()
    }

    /// Base64 digest, as sent on the wire.
    pub fn digest_base64(&self) -> String {
        to_base64(&self.digest)
    }
}

/// Format a timestamp the way the `Created` element expects it.
pub fn format_created(timestamp: DateTime<Utc>) -> String {
    timestamp.format(CREATED_FORMAT).to_string()
}

/// Compute the raw password digest.
pub fn password_digest(credentials: &Credentials, nonce: &Nonce, created: &str) -> [u8; 20] {
    let hashed = credentials.password.hashed();
    sha1_concat(&[&nonce.as_bytes()[..], created.as_bytes(), &hashed[..]])
}

/// Builds [`AuthHeader`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeaderBuilder;

impl SecurityHeaderBuilder {
    /// Build the header for one call.
    ///
    /// # Errors
    /// Returns `SessionError::CredentialsInvalid` if a required credential
    /// field is missing.
    pub fn build(
        credentials: &Credentials,
        nonce: Nonce,
        timestamp: DateTime<Utc>,
        session: &SessionState,
    ) -> Result<AuthHeader, SessionError> {
        credentials.validate()?;

        let created = format_created(timestamp);
        let digest = password_digest(credentials, &nonce, &created);

        Ok(AuthHeader {
            username: credentials.user_id.clone(),
            nonce,
            created,
            digest,
            office_id: credentials.office_id.clone(),
            originator_id: credentials.originator_id.clone(),
            duty_code: credentials.duty_code.clone(),
            organization_id: credentials.organization_id.clone(),
            session_id: session.session_id.clone(),
            security_token: session.security_token.clone(),
        })
    }
}
