//! Credential Store
//!
//! Persists the bearer token between CLI runs as a small JSON file in the
//! user's config directory.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::api::Token;
use crate::config::CredentialsConfig;
use crate::stream::Credential;

/// Credential store errors
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to access credential file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Credential file {path:?} is corrupt: {error}")]
    Format { path: PathBuf, error: String },

    #[error("No config directory available; set OPTIYA_TOKEN_FILE")]
    NoConfigDir,
}

pub type CredentialResult<T> = Result<T, CredentialError>;

/// Token as kept on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    pub fn from_token(token: &Token, email: Option<String>) -> Self {
        let expires_at = (token.expires_in > 0)
            .then(|| Utc::now() + Duration::seconds(token.expires_in));
        Self {
            access_token: token.access_token.clone(),
            token_type: token.token_type.clone(),
            email,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|t| t <= Utc::now()).unwrap_or(false)
    }

    pub fn credential(&self) -> Credential {
        Credential::new(self.access_token.clone())
    }
}

/// JSON token file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &CredentialsConfig) -> CredentialResult<Self> {
        config
            .token_path()
            .map(Self::new)
            .ok_or(CredentialError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored token, if any, expired or not
    pub fn load(&self) -> CredentialResult<Option<StoredCredential>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CredentialError::Format {
                path: self.path.clone(),
                error: e.to_string(),
            })
    }

    /// Usable credential; expired tokens count as absent
    pub fn credential(&self) -> CredentialResult<Option<Credential>> {
        Ok(self.load()?.and_then(|stored| {
            if stored.is_expired() {
                tracing::info!(path = ?self.path, "Stored token expired");
                None
            } else {
                Some(stored.credential())
            }
        }))
    }

    pub fn save(&self, stored: &StoredCredential) -> CredentialResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let json = serde_json::to_string_pretty(stored).map_err(|e| CredentialError::Format {
            path: self.path.clone(),
            error: e.to_string(),
        })?;
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        tracing::debug!(path = ?self.path, "Saved credential");
        Ok(())
    }

    /// Forget the stored token; a missing file is not an error
    pub fn clear(&self) -> CredentialResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn io_error(&self, e: std::io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.clone(),
            error: e.to_string(),
        }
    }
}
