//! Session persistence.
//!
//! One JSON document per data directory:
//!
//! ```text
//! $SLOTLIGHT_DATA/session.json
//! $XDG_DATA_HOME/slotlight/session.json
//! <platform data dir>/slotlight/session.json
//! ```
//!
//! Writes go through a temp file plus rename so a crash never leaves a
//! half-written document behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sl_config::MachineCatalog;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::SessionState;
use crate::logging::{event_names, Stage};

pub const ENV_DATA_DIR: &str = "SLOTLIGHT_DATA";
const DIR_NAME: &str = "slotlight";
const SESSION_FILE: &str = "session.json";

/// Schema version of the persisted session document.
pub const SESSION_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to resolve data dir (set {ENV_DATA_DIR} or XDG_DATA_HOME)")]
    DataDirUnavailable,

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored session at {path} is unusable: {reason}")]
    Corrupted { path: PathBuf, reason: String },
}

impl From<SessionError> for sl_common::Error {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::DataDirUnavailable => sl_common::Error::Config(err.to_string()),
            SessionError::Io { source, .. } => sl_common::Error::Io(source),
            SessionError::Json { .. } | SessionError::Corrupted { .. } => {
                sl_common::Error::SessionCorrupted(err.to_string())
            }
        }
    }
}

/// On-disk form of a [`SessionState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub schema_version: String,
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: SessionState,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    /// Store rooted at the resolved data directory.
    pub fn from_env() -> Result<Self, SessionError> {
        Ok(Self {
            root: resolve_data_dir()?,
        })
    }

    /// Store rooted at an explicit directory (used by `--data-dir` and tests).
    pub fn with_dir(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_path(&self) -> PathBuf {
        self.root.join(SESSION_FILE)
    }

    /// Load the stored session, falling back to a fresh one when the file is
    /// missing, unreadable as JSON, or names a machine the catalog lacks.
    pub fn load(&self, catalog: &MachineCatalog) -> Result<SessionState, SessionError> {
        match self.load_strict(catalog) {
            Ok(state) => Ok(state),
            Err(err @ (SessionError::Json { .. } | SessionError::Corrupted { .. })) => {
                tracing::warn!(
                    event = event_names::SESSION_DISCARDED,
                    stage = %Stage::Session,
                    path = %self.session_path().display(),
                    error = %err,
                    "discarding stored session"
                );
                Ok(SessionState::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Like [`load`](Self::load) but reports corrupt or stale sessions.
    pub fn load_strict(&self, catalog: &MachineCatalog) -> Result<SessionState, SessionError> {
        let path = self.session_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    event = event_names::SESSION_FRESH,
                    stage = %Stage::Session,
                    path = %path.display(),
                    "no stored session"
                );
                return Ok(SessionState::new());
            }
            Err(source) => return Err(SessionError::Io { path, source }),
        };

        let stored: StoredSession =
            serde_json::from_str(&content).map_err(|source| SessionError::Json {
                path: path.clone(),
                source,
            })?;

        if stored.schema_version != SESSION_SCHEMA_VERSION {
            return Err(SessionError::Corrupted {
                path,
                reason: format!(
                    "schema version {} (expected {})",
                    stored.schema_version, SESSION_SCHEMA_VERSION
                ),
            });
        }

        let mut state = stored.state;
        if let Some(id) = state.machine_id.as_deref() {
            let Some(machine) = catalog.machine(id) else {
                return Err(SessionError::Corrupted {
                    path,
                    reason: format!("unknown machine '{id}'"),
                });
            };
            // Events added to the catalog since the last save start at zero.
            for event in &machine.events {
                state.counts.entry(event.id.clone()).or_insert(0);
            }
        }

        tracing::debug!(
            event = event_names::SESSION_LOADED,
            stage = %Stage::Session,
            machine = state.machine_id.as_deref().unwrap_or("-"),
            saved_at = %stored.saved_at,
            "session loaded"
        );
        Ok(state)
    }

    /// Persist `state`. Nothing is written while no machine is selected.
    ///
    /// Returns whether a document was written.
    pub fn save(&self, state: &SessionState) -> Result<bool, SessionError> {
        if state.machine_id.is_none() {
            return Ok(false);
        }
        let stored = StoredSession {
            schema_version: SESSION_SCHEMA_VERSION.to_string(),
            saved_at: Utc::now(),
            state: state.clone(),
        };
        let path = self.session_path();
        write_json_pretty_atomic(&path, &stored)?;
        tracing::debug!(
            event = event_names::SESSION_SAVED,
            stage = %Stage::Session,
            path = %path.display(),
            "session saved"
        );
        Ok(true)
    }

    /// Delete the stored document. Returns whether one existed.
    pub fn remove(&self) -> Result<bool, SessionError> {
        let path = self.session_path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SessionError::Io { path, source }),
        }
    }
}

fn resolve_data_dir() -> Result<PathBuf, SessionError> {
    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        return Ok(PathBuf::from(dir));
    }

    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return Ok(PathBuf::from(xdg).join(DIR_NAME));
    }

    if let Some(base) = dirs::data_dir() {
        return Ok(base.join(DIR_NAME));
    }

    Err(SessionError::DataDirUnavailable)
}

fn write_json_pretty_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), SessionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SessionError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let content = serde_json::to_vec_pretty(value).map_err(|e| SessionError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(SESSION_FILE);
    let tmp_path = path.with_file_name(format!("{}.tmp.{}", file_name, std::process::id()));
    {
        use std::io::Write;
        let mut file = std::fs::File::create(&tmp_path).map_err(|e| SessionError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
        file.write_all(&content).map_err(|e| SessionError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
        let _ = file.sync_all();
    }
    std::fs::rename(&tmp_path, path).map_err(|e| SessionError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_session_category() {
        let err: sl_common::Error = SessionError::Corrupted {
            path: PathBuf::from("/tmp/x"),
            reason: "bad".into(),
        }
        .into();
        assert_eq!(err.code(), 51);

        let err: sl_common::Error = SessionError::DataDirUnavailable.into();
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn session_path_is_under_root() {
        let store = SessionStore::with_dir("/data/slotlight");
        assert_eq!(
            store.session_path(),
            PathBuf::from("/data/slotlight/session.json")
        );
    }
}
