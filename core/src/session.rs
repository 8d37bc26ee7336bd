//! Bearer-token session accessor.
//!
//! # Design
//! The token lives in a [`TokenStore`] under the key [`TOKEN_KEY`]. A
//! [`Session`] is an explicit, cloneable handle to that store and is handed to
//! the resource client at construction; nothing reads the token through a
//! global. Store operations never fail from the caller's point of view:
//! storage problems are logged and the token is treated as absent.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};

/// Well-known key the token is persisted under.
pub const TOKEN_KEY: &str = "token";

/// Key/value persistence for session state.
pub trait TokenStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Process-local store. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }
}

#[derive(Debug, Error)]
enum StoreError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("session file is not a JSON object of strings: {0}")]
    Format(#[from] serde_json::Error),
}

/// Store persisted as a JSON object in a single file. A missing file is an
/// empty store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    fn update(&self, key: &str, apply: impl FnOnce(&mut BTreeMap<String, String>)) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let entries = match self.read_entries() {
            Err(StoreError::Format(e)) => {
                warn!(path = %self.path.display(), key, error = %e, "discarding unreadable session state");
                Ok(BTreeMap::new())
            }
            read => read,
        };
        let result = entries.and_then(|mut entries| {
            apply(&mut entries);
            self.write_entries(&entries)
        });
        if let Err(e) = result {
            warn!(path = %self.path.display(), key, error = %e, "failed to persist session state");
        }
    }
}

impl TokenStore for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.read_entries() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                warn!(path = %self.path.display(), key, error = %e, "failed to read session state");
                None
            }
        }
    }

    fn save(&self, key: &str, value: &str) {
        self.update(key, |entries| {
            entries.insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: &str) {
        self.update(key, |entries| {
            entries.remove(key);
        });
    }
}

/// Handle to the authentication context shared by every request.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl Session {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Session with a process-local store and no token.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Current bearer token. An empty stored value counts as absent.
    pub fn get_token(&self) -> Option<String> {
        self.store.load(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    pub fn set_token(&self, token: &str) {
        debug!("storing session token");
        self.store.save(TOKEN_KEY, token);
    }

    pub fn clear_token(&self) {
        debug!("clearing session token");
        self.store.remove(TOKEN_KEY);
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
