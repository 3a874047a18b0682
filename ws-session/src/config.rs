//! Factory configuration.
//!
//! Only one thing is configurable at factory level: where the persisted
//! nonce base lives. Everything per-conversation goes through
//! [`SessionHandlerParams`](crate::factory::SessionHandlerParams).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_NONCE_BASE_PATH;
use crate::errors::SessionError;

/// Factory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactoryConfig {
    /// Nonce base file. `None` skips the lookup and always generates an
    /// ephemeral base.
    pub nonce_base_path: Option<PathBuf>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            nonce_base_path: Some(PathBuf::from(DEFAULT_NONCE_BASE_PATH)),
        }
    }
}

impl FactoryConfig {
    /// Configuration that never touches the filesystem.
    pub fn ephemeral() -> Self {
        Self {
            nonce_base_path: None,
        }
    }

    /// Configuration reading the nonce base from `path`.
    pub fn with_nonce_base_path(path: impl Into<PathBuf>) -> Self {
        Self {
            nonce_base_path: Some(path.into()),
        }
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidParams` on malformed JSON or unknown
    /// fields.
    pub fn from_json_str(json: &str) -> Result<Self, SessionError> {
        serde_json::from_str(json)
            .map_err(|e| SessionError::InvalidParams(format!("factory config: {e}")))
    }

    /// Read and parse a JSON file.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidParams` if the file cannot be read or
    /// parsed.
    pub fn from_path(path: &Path) -> Result<Self, SessionError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SessionError::InvalidParams(format!("factory config {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }
}
