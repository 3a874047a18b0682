//! The identity a session authenticates as.
//!
//! Credentials are immutable once built and shared by reference (`Arc`)
//! between any number of handlers. Password material is zeroized on drop
//! and never appears in `Debug` output.

use std::fmt;

use zeroize::Zeroizing;

use crate::constants::{DEFAULT_DUTY_CODE, DEFAULT_ORIGINATOR_ID};
use crate::encoding::from_base64;
use crate::errors::SessionError;
use crate::hash::sha1;

/// Password material.
///
/// The digest only ever needs `SHA1(password)`, so a caller that does not
/// want to hold the clear password can supply that hash instead.
#[derive(Clone)]
pub enum Password {
    /// Clear password bytes.
    Clear(Zeroizing<Vec<u8>>),
    /// Pre-computed SHA-1 of the clear password.
    Sha1Hash(Zeroizing<[u8; 20]>),
}

impl Password {
    /// Clear password from a string.
    pub fn clear(password: impl Into<String>) -> Self {
        Password::Clear(Zeroizing::new(password.into().into_bytes()))
    }

    /// Clear password from its base64-encoded "password data" form.
    ///
    /// # Errors
    /// Returns `SessionError::CredentialsInvalid` on invalid base64.
    pub fn from_base64(password_data: &str) -> Result<Self, SessionError> {
        let bytes = from_base64(password_data)
            .map_err(|e| SessionError::CredentialsInvalid(format!("password data: {e}")))?;
        Ok(Password::Clear(Zeroizing::new(bytes)))
    }

    /// Password supplied as its SHA-1 hash.
    pub fn sha1_hash(hash: [u8; 20]) -> Self {
        Password::Sha1Hash(Zeroizing::new(hash))
    }

    /// `SHA1(password)`, the only form the digest consumes.
    pub fn hashed(&self) -> Zeroizing<[u8; 20]> {
        match self {
            Password::Clear(bytes) => Zeroizing::new(sha1(bytes)),
            Password::Sha1Hash(hash) => hash.clone(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Password::Clear(bytes) => bytes.is_empty(),
            Password::Sha1Hash(_) => false,
        }
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Password::Clear(_) => f.write_str("Password::Clear(<redacted>)"),
            Password::Sha1Hash(_) => f.write_str("Password::Sha1Hash(<redacted>)"),
        }
    }
}

/// Authentication inputs for one office/user.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Office (pseudo city code) the user signs into.
    pub office_id: String,
    /// WS-Security username.
    pub user_id: String,
    /// Requestor type of the hosted user.
    pub originator_id: String,
    /// Agent duty code of the hosted user.
    pub duty_code: String,
    /// Organization the user belongs to, if the dialect wants it.
    pub organization_id: Option<String>,
    /// Password or password hash.
    pub password: Password,
}

impl Credentials {
    /// Credentials with default originator and duty code.
    pub fn new(
        office_id: impl Into<String>,
        user_id: impl Into<String>,
        password: Password,
    ) -> Self {
        Self {
            office_id: office_id.into(),
            user_id: user_id.into(),
            originator_id: DEFAULT_ORIGINATOR_ID.to_string(),
            duty_code: DEFAULT_DUTY_CODE.to_string(),
            organization_id: None,
            password,
        }
    }

    /// Set the organization id.
    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    /// Set the originator (requestor type).
    pub fn with_originator(mut self, originator_id: impl Into<String>) -> Self {
        self.originator_id = originator_id.into();
        self
    }

    /// Set the agent duty code.
    pub fn with_duty_code(mut self, duty_code: impl Into<String>) -> Self {
        self.duty_code = duty_code.into();
        self
    }

    /// Check that every field the header needs is present.
    ///
    /// # Errors
    /// Returns `SessionError::CredentialsInvalid` naming the first missing
    /// field.
    pub fn validate(&self) -> Result<(), SessionError> {
        let required = [
            ("office_id", self.office_id.as_str()),
            ("user_id", self.user_id.as_str()),
            ("originator_id", self.originator_id.as_str()),
            ("duty_code", self.duty_code.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SessionError::CredentialsInvalid(format!(
                    "missing {field}"
                )));
            }
        }
        if self
            .organization_id
            .as_deref()
            .is_some_and(|org| org.trim().is_empty())
        {
            return Err(SessionError::CredentialsInvalid(
                "organization_id is set but empty".into(),
            ));
        }
        if self.password.is_empty() {
            return Err(SessionError::CredentialsInvalid("missing password".into()));
        }
        Ok(())
    }
}
