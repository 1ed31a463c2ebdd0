//! Persisted login session.
//!
//! The session file replaces browser storage: it holds the bearer token and
//! the identity it was issued for, and is checked for expiry before any
//! authenticated request is built.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::model::{LoginResponse, Role};

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Fail unless the session is still valid and was issued for `role`.
    pub fn ensure(&self, role: Option<Role>) -> ClientResult<()> {
        if self.is_expired() {
            return Err(ClientError::SessionExpired);
        }
        match role {
            Some(required) if required != self.role => Err(ClientError::WrongRole {
                required,
                actual: self.role,
            }),
            _ => Ok(()),
        }
    }
}

impl From<LoginResponse> for Session {
    fn from(resp: LoginResponse) -> Self {
        Self {
            token: resp.token,
            role: resp.role,
            name: resp.name,
            expires_at: resp.expires_at,
        }
    }
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `session.json` inside the CareFlow home directory (`~/.careflow`).
    pub fn in_home_dir(home: &Path) -> Self {
        Self::new(home.join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> ClientResult<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| ClientError::SessionFormat {
                path: self.path.clone(),
                source,
            })
    }

    pub fn save(&self, session: &Session) -> ClientResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        let body = serde_json::to_string_pretty(session).map_err(|source| {
            ClientError::SessionFormat {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, body).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Remove the session file. Returns whether one existed.
    pub fn clear(&self) -> ClientResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Load the session required by an authenticated command. An expired
    /// session is removed so the next command reports "not logged in".
    pub fn require(&self, role: Option<Role>) -> ClientResult<Session> {
        let session = self.load()?.ok_or(ClientError::NotLoggedIn)?;
        if session.is_expired() {
            self.clear()?;
            return Err(ClientError::SessionExpired);
        }
        session.ensure(role)?;
        Ok(session)
    }

    fn io_error(&self, source: std::io::Error) -> ClientError {
        ClientError::SessionIo {
            path: self.path.clone(),
            source,
        }
    }
}
