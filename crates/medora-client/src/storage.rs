//! # Session Storage
//!
//! Persists the signed-in session between launches.
//!
//! ## Persisted Shape
//! ```json
//! {
//!   "accessToken": "eyJ...",
//!   "refreshToken": "d1c2...",      // only with "remember me"
//!   "user": { "name": "Sara", "email": "sara@example.com", "lang": "ar" }
//! }
//! ```
//!
//! The [`SessionManager`](crate::session::SessionManager) is the only writer.

use medora_core::UserProfile;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Everything needed to reinstate a session without the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user: UserProfile,
}

/// Where the session is kept between launches.
///
/// Calls are synchronous and never made while a lock is held across an
/// `.await`. They do run on the async caller's thread while the session
/// manager holds its state lock, so implementations must stay small and
/// quick: [`FileSessionStore`] writes one small file and fsyncs it.
pub trait SessionStore: Send + Sync {
    /// Returns the stored session, `None` when nothing is stored.
    fn load(&self) -> ClientResult<Option<PersistedSession>>;

    /// Replaces the stored session.
    fn save(&self, session: &PersistedSession) -> ClientResult<()>;

    /// Removes the stored session. Clearing an empty store succeeds.
    fn clear(&self) -> ClientResult<()>;
}

// =============================================================================
// File Store
// =============================================================================

/// Stores the session as `session.json`, readable only by its owner.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> ClientResult<Option<PersistedSession>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ClientError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&contents).map(Some).map_err(|e| {
            ClientError::Storage(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, session: &PersistedSession) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Storage(format!("Failed to create directory {}: {}", parent.display(), e))
            })?;
        }

        let contents = serde_json::to_string_pretty(session)?;
        let temp = self.temp_path();

        // Write-then-rename so a crash never leaves a half-written file.
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&temp).map_err(|e| {
            ClientError::Storage(format!("Failed to open {} for writing: {}", temp.display(), e))
        })?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| ClientError::Storage(format!("Failed to write {}: {}", temp.display(), e)))?;
        fs::rename(&temp, &self.path).map_err(|e| {
            ClientError::Storage(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!(path = %self.path.display(), "Session persisted");
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// Keeps the session in memory only. Used by tests and by callers that do
/// not want anything written to disk.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `session`.
    pub fn with_session(session: PersistedSession) -> Self {
        MemorySessionStore {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> ClientResult<Option<PersistedSession>> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &PersistedSession) -> ClientResult<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// Shared stores let tests keep a handle while the manager owns another.
impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    fn load(&self) -> ClientResult<Option<PersistedSession>> {
        (**self).load()
    }

    fn save(&self, session: &PersistedSession) -> ClientResult<()> {
        (**self).save(session)
    }

    fn clear(&self) -> ClientResult<()> {
        (**self).clear()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session(refresh: Option<&str>) -> PersistedSession {
        PersistedSession {
            access_token: "T1".into(),
            refresh_token: refresh.map(String::from),
            user: serde_json::from_str(r#"{"name":"Sara","email":"sara@example.com"}"#).unwrap(),
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().unwrap(), None);

        store.save(&session(Some("R1"))).unwrap();
        assert_eq!(store.load().unwrap(), Some(session(Some("R1"))));
        assert!(!store.temp_path().exists());

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&session(None)).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileSessionStore::new(path);
        assert!(matches!(store.load(), Err(ClientError::Storage(_))));
    }

    #[test]
    fn test_refresh_token_omitted_when_absent() {
        let json = serde_json::to_string(&session(None)).unwrap();
        assert!(json.contains("accessToken"));
        assert!(!json.contains("refreshToken"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save(&session(Some("R1"))).unwrap();
        assert!(store.load().unwrap().is_some());

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
