//! Typed, namespaced, schema-versioned key-value state for the widgets.
//!
//! Call sites never build raw keys: they name a [`Namespace`] and a scope
//! (usually a slug or page path), and get typed values back. The storage
//! backend can be swapped without touching them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const SCHEMA_VERSION: u32 = 1;
const KEY_PREFIX: &str = "dense";

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("backend lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Views,
    LabChat,
    Annotations,
    Account,
    Reports,
    EmailFeed,
    Outbox,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Views => "views",
            Namespace::LabChat => "lab-chat",
            Namespace::Annotations => "annotations",
            Namespace::Account => "account",
            Namespace::Reports => "report",
            Namespace::EmailFeed => "email-feed",
            Namespace::Outbox => "outbox",
        }
    }
}

/// Raw string storage, e.g. browser localStorage or a file.
pub trait StateBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StateError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StateError>;
    fn remove(&self, key: &str) -> Result<(), StateError>;
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.entries.lock().map_err(|_| StateError::Poisoned)?.get(key).cloned())
    }
    fn write(&self, key: &str, value: &str) -> Result<(), StateError> {
        self.entries.lock().map_err(|_| StateError::Poisoned)?.insert(key.to_string(), value.to_string());
        Ok(())
    }
    fn remove(&self, key: &str) -> Result<(), StateError> {
        self.entries.lock().map_err(|_| StateError::Poisoned)?.remove(key);
        Ok(())
    }
}

/// All keys kept in one pretty-printed JSON snapshot file.
pub struct FileBackend {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileBackend {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!("unreadable state snapshot '{}': {e}; starting empty", path.display());
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self { path, entries: Mutex::new(entries) }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StateError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}

impl StateBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.entries.lock().map_err(|_| StateError::Poisoned)?.get(key).cloned())
    }
    fn write(&self, key: &str, value: &str) -> Result<(), StateError> {
        let mut entries = self.entries.lock().map_err(|_| StateError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }
    fn remove(&self, key: &str) -> Result<(), StateError> {
        let mut entries = self.entries.lock().map_err(|_| StateError::Poisoned)?;
        entries.remove(key);
        self.persist(&entries)
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    schema: u32,
    data: T,
}

#[derive(Clone)]
pub struct LocalState {
    backend: Arc<dyn StateBackend>,
}

impl LocalState {
    pub fn new(backend: Arc<dyn StateBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn key(ns: Namespace, scope: &str) -> String {
        format!("{KEY_PREFIX}:{}:{scope}", ns.as_str())
    }

    /// Missing, unreadable or other-schema values all read as `None`.
    pub fn load<T: DeserializeOwned>(&self, ns: Namespace, scope: &str) -> Option<T> {
        let key = Self::key(ns, scope);
        let raw = match self.backend.read(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("local state read {key} failed: {e}");
                return None;
            }
        };
        match serde_json::from_str::<Envelope<T>>(&raw) {
            Ok(env) if env.schema == SCHEMA_VERSION => Some(env.data),
            Ok(env) => {
                log::info!("ignoring {key}: schema {} != {SCHEMA_VERSION}", env.schema);
                None
            }
            Err(e) => {
                log::warn!("ignoring unreadable {key}: {e}");
                None
            }
        }
    }

    pub fn save<T: Serialize>(&self, ns: Namespace, scope: &str, value: &T) -> Result<(), StateError> {
        let raw = serde_json::to_string(&Envelope { schema: SCHEMA_VERSION, data: value })?;
        self.backend.write(&Self::key(ns, scope), &raw)
    }

    pub fn clear(&self, ns: Namespace, scope: &str) -> Result<(), StateError> {
        self.backend.remove(&Self::key(ns, scope))
    }

    /// `save`, logging instead of failing; widget state is best effort.
    pub fn save_or_log<T: Serialize>(&self, ns: Namespace, scope: &str, value: &T) -> bool {
        match self.save(ns, scope, value) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("local state write {} failed: {e}", Self::key(ns, scope));
                false
            }
        }
    }
}
