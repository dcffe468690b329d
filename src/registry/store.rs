use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use tracing::{error, warn};
use crate::error::{HashWatchError, Result};
use super::entry::Registry;

pub trait StateStore: Send + Sync {
    fn load(&self) -> Result<Registry>;

    /// Replaces the whole persisted registry. A failed save must leave the
    /// previously persisted document readable.
    fn save(&self, registry: &Registry) -> Result<()>;

    fn location(&self) -> String;

    /// Load, reporting any failure and falling back to an empty registry.
    fn load_or_default(&self) -> Registry {
        match self.load() {
            Ok(registry) => {
                for issue in registry.validate() {
                    warn!("Registry {}: {}", self.location(), issue);
                }
                registry
            }
            Err(e) => {
                error!("{}; continuing with an empty registry", e);
                Registry::default()
            }
        }
    }
}

/// Registry stored as a pretty-printed JSON document on disk.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_pretty_json(registry: &Registry) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        registry.serialize(&mut ser)?;
        buf.push(b'\n');
        Ok(buf)
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<Registry> {
        let content = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                HashWatchError::StoreLoad(format!("{} not found", self.path.display()))
            }
            _ => HashWatchError::StoreLoad(format!("{}: {}", self.path.display(), e)),
        })?;

        serde_json::from_str(&content)
            .map_err(|e| HashWatchError::StoreLoad(format!("{}: {}", self.path.display(), e)))
    }

    fn save(&self, registry: &Registry) -> Result<()> {
        let bytes = Self::to_pretty_json(registry)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let write_err = |e: std::io::Error| {
            HashWatchError::StoreWrite(format!("{}: {}", self.path.display(), e))
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        if let Ok(existing) = fs::metadata(&self.path) {
            tmp.as_file().set_permissions(existing.permissions()).map_err(write_err)?;
        }
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process store. Clones share the same underlying document.
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    registry: Arc<Mutex<Option<Registry>>>,
    saves: Arc<AtomicUsize>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: Registry) -> Self {
        let store = Self::default();
        *store.lock() = Some(registry);
        store
    }

    pub fn snapshot(&self) -> Option<Registry> {
        self.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Registry>> {
        self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Registry> {
        self.lock()
            .clone()
            .ok_or_else(|| HashWatchError::StoreLoad("in-memory registry is empty".into()))
    }

    fn save(&self, registry: &Registry) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(HashWatchError::StoreWrite("in-memory store rejected write".into()));
        }
        *self.lock() = Some(registry.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
