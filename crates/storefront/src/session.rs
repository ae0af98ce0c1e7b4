//! Login session state.
//!
//! The session (`token`, `username`, `balance`) is an explicit object that
//! callers pass by reference. It is written to disk on login and removed on
//! logout so it survives a restart.
//!
//! Writes go to a temporary file that is then renamed over the target, so a
//! reader never sees a half-written session.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::{clear_sentry_user, set_sentry_user};

/// Errors that can occur when persisting or restoring a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the session is kept between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPersistence {
    /// Not persisted; lost when the process exits.
    Memory,
    /// Persisted as JSON at the given path.
    File(PathBuf),
}

/// A logged-in user.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
    username: String,
    balance: u64,
    logged_in_at: DateTime<Utc>,
}

impl Session {
    /// Bearer token for authenticated requests.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Wallet balance reported by the backend at login.
    #[must_use]
    pub const fn balance(&self) -> u64 {
        self.balance
    }

    #[must_use]
    pub const fn logged_in_at(&self) -> DateTime<Utc> {
        self.logged_in_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .field("balance", &self.balance)
            .field("logged_in_at", &self.logged_in_at)
            .finish()
    }
}

/// On-disk form of [`Session`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    token: String,
    username: String,
    balance: u64,
    logged_in_at: DateTime<Utc>,
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.expose_secret().to_string(),
            username: session.username.clone(),
            balance: session.balance,
            logged_in_at: session.logged_in_at,
        }
    }
}

impl From<PersistedSession> for Session {
    fn from(persisted: PersistedSession) -> Self {
        Self {
            token: SecretString::from(persisted.token),
            username: persisted.username,
            balance: persisted.balance,
            logged_in_at: persisted.logged_in_at,
        }
    }
}

/// Holds the current session and keeps its persisted copy in sync.
#[derive(Debug)]
pub struct SessionStore {
    persistence: SessionPersistence,
    current: Option<Session>,
}

impl SessionStore {
    /// A logged-out store that is never written to disk.
    #[must_use]
    pub const fn in_memory() -> Self {
        Self {
            persistence: SessionPersistence::Memory,
            current: None,
        }
    }

    /// Open a store, restoring a previously persisted session if one exists.
    ///
    /// A missing file means logged out.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the file exists but cannot be read or
    /// decoded.
    pub fn load(persistence: SessionPersistence) -> Result<Self, SessionError> {
        let current = match &persistence {
            SessionPersistence::Memory => None,
            SessionPersistence::File(path) => read_session(path)?,
        };

        if let Some(session) = &current {
            debug!(username = %session.username, "Restored session");
            set_sentry_user(&session.username);
        }

        Ok(Self {
            persistence,
            current,
        })
    }

    /// Store a new session, replacing any existing one.
    ///
    /// The in-memory session only changes once the persisted copy has been
    /// written, so a failed write leaves the store as it was.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Io` if the session file cannot be written.
    pub fn login(
        &mut self,
        token: SecretString,
        username: impl Into<String>,
        balance: u64,
    ) -> Result<&Session, SessionError> {
        let session = Session {
            token,
            username: username.into(),
            balance,
            logged_in_at: Utc::now(),
        };

        if let SessionPersistence::File(path) = &self.persistence {
            write_session(path, &PersistedSession::from(&session))?;
        }

        info!(username = %session.username, "Logged in");
        set_sentry_user(&session.username);
        Ok(&*self.current.insert(session))
    }

    /// Clear the session and remove its persisted copy.
    ///
    /// Logging out while logged out is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Io` if the session file exists but cannot be
    /// removed; the in-memory session is kept in that case.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        if let SessionPersistence::File(path) = &self.persistence {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(SessionError::Io {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }

        if let Some(session) = self.current.take() {
            info!(username = %session.username, "Logged out");
        }
        clear_sentry_user();
        Ok(())
    }

    /// Whether a non-empty token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// The current session, if logged in.
    ///
    /// A session whose token is empty counts as logged out.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.current
            .as_ref()
            .filter(|session| !session.token.expose_secret().is_empty())
    }

    /// Bearer token of the current session, if logged in.
    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.session().map(Session::token)
    }

    #[must_use]
    pub const fn persistence(&self) -> &SessionPersistence {
        &self.persistence
    }
}

// =============================================================================
// Persistence Helpers
// =============================================================================

fn read_session(path: &Path) -> Result<Option<Session>, SessionError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SessionError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let persisted: PersistedSession =
        serde_json::from_str(&contents).map_err(|source| SessionError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Some(persisted.into()))
}

fn write_session(path: &Path, session: &PersistedSession) -> Result<(), SessionError> {
    let io_err = |source: io::Error| SessionError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_vec_pretty(session).map_err(|source| SessionError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp_path = path.with_extension("tmp");
    let mut file = open_private(&tmp_path).map_err(io_err)?;
    file.write_all(&json).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(io_err)
}

/// Create (or truncate) a file readable only by the current user.
fn open_private(path: &Path) -> io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}
