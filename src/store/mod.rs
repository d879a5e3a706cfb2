//! Session persistence.
//!
//! The store is a keyed snapshot repository: `save` writes the full
//! `SessionState` after a transition has been fully computed, `load`
//! returns the last committed snapshot. No partial updates are exposed.
//! `JsonSessionStore` keeps one JSON file per session and writes
//! atomically (temp file + rename) so a crash mid-write never leaves a
//! torn snapshot behind.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::StoreError;
use crate::session::{SessionMeta, SessionState};

/// Durable keyed storage of session snapshots.
pub trait SessionStore: Send + Sync {
    /// Load the last committed snapshot, or `None` for an unknown id.
    fn load(&self, id: &str) -> Result<Option<SessionState>, StoreError>;

    /// Persist a full snapshot atomically.
    fn save(&self, state: &SessionState) -> Result<(), StoreError>;

    /// Remove a session. Deleting an unknown id is not an error.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Describe all stored sessions, most recently updated first.
    fn list(&self) -> Result<Vec<SessionMeta>, StoreError>;
}

/// One JSON file per session under a sessions directory.
pub struct JsonSessionStore {
    sessions_dir: PathBuf,
}

impl JsonSessionStore {
    /// Create a store rooted at `sessions_dir`, creating the directory if
    /// needed.
    pub fn new(sessions_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let sessions_dir = sessions_dir.as_ref().to_path_buf();
        fs::create_dir_all(&sessions_dir).map_err(|source| StoreError::Io {
            path: sessions_dir.clone(),
            source,
        })?;
        Ok(Self { sessions_dir })
    }

    fn session_file(&self, id: &str) -> PathBuf {
        self.sessions_dir.join(format!("{}.json", id))
    }

    fn load_from(&self, path: &Path) -> Result<SessionState, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StoreError::Deserialize {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl SessionStore for JsonSessionStore {
    fn load(&self, id: &str) -> Result<Option<SessionState>, StoreError> {
        let path = self.session_file(id);
        if !path.exists() {
            return Ok(None);
        }
        self.load_from(&path).map(Some)
    }

    fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(state).map_err(|source| StoreError::Serialize {
                id: state.id.clone(),
                source,
            })?;

        // Write-then-rename keeps the committed snapshot intact if this
        // process dies mid-write.
        let path = self.session_file(&state.id);
        let tmp = self.sessions_dir.join(format!("{}.json.tmp", state.id));
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.session_file(id);
        if path.exists() {
            fs::remove_file(&path).map_err(|source| StoreError::Io { path, source })?;
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<SessionMeta>, StoreError> {
        let entries = fs::read_dir(&self.sessions_dir).map_err(|source| StoreError::Io {
            path: self.sessions_dir.clone(),
            source,
        })?;

        let mut sessions = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json")
                && let Ok(state) = self.load_from(&path)
            {
                sessions.push(SessionMeta::from(&state));
            }
        }

        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }
}

/// In-memory store for tests and embedders that manage their own
/// durability.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &str) -> Result<Option<SessionState>, StoreError> {
        Ok(self
            .sessions
            .lock()
            .expect("memory store mutex poisoned")
            .get(id)
            .cloned())
    }

    fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .expect("memory store mutex poisoned")
            .insert(state.id.clone(), state.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .expect("memory store mutex poisoned")
            .remove(id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<SessionMeta>, StoreError> {
        let mut sessions: Vec<SessionMeta> = self
            .sessions
            .lock()
            .expect("memory store mutex poisoned")
            .values()
            .map(SessionMeta::from)
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }
}
