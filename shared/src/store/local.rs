use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::error::CacheError;
use crate::models::Evite;

/// Named string slots persisted on the client side.
pub trait SlotStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn write(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// One file per slot under a directory.
#[derive(Debug, Clone)]
pub struct FileSlotStorage {
    dir: PathBuf,
}

impl FileSlotStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl SlotStorage for FileSlotStorage {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;

        // Each write gets its own temp file; readers only ever see a complete slot.
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(value.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(self.slot_path(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySlotStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySlotStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStorage for MemorySlotStorage {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        let slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots.remove(key);
        Ok(())
    }
}

/// Best-effort mirror of the full evite list in a single slot.
///
/// Never the system of record. Unreadable or corrupt contents read as empty.
/// Mutations hold the cache lock across their whole read-modify-write.
pub struct LocalEviteCache<S> {
    storage: S,
    slot: String,
    write_lock: Mutex<()>,
}

impl<S: SlotStorage> LocalEviteCache<S> {
    pub fn new(storage: S, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn read_all(&self) -> Vec<Evite> {
        let _guard = self.lock();
        self.read_unlocked()
    }

    fn read_unlocked(&self) -> Vec<Evite> {
        let raw = match self.storage.read(&self.slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read local evite cache '{}': {}", self.slot, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Evite>>(&raw) {
            Ok(evites) => evites,
            Err(e) => {
                warn!(
                    "Local evite cache '{}' is corrupt, treating as empty: {}",
                    self.slot, e
                );
                Vec::new()
            }
        }
    }

    pub fn write_all(&self, evites: &[Evite]) -> Result<(), CacheError> {
        let _guard = self.lock();
        self.write_unlocked(evites)
    }

    fn write_unlocked(&self, evites: &[Evite]) -> Result<(), CacheError> {
        let json = serde_json::to_string(evites)?;
        self.storage.write(&self.slot, &json)?;
        debug!("Wrote {} evites to local cache '{}'", evites.len(), self.slot);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        let _guard = self.lock();
        self.storage.remove(&self.slot)
    }

    pub fn get(&self, id: &str) -> Option<Evite> {
        self.read_all().into_iter().find(|e| e.id == id)
    }

    /// Replaces the cached evite with the same id in place, or inserts at the front.
    pub fn upsert_one(&self, evite: &Evite) -> Result<(), CacheError> {
        let _guard = self.lock();
        let mut evites = self.read_unlocked();
        match evites.iter_mut().find(|e| e.id == evite.id) {
            Some(existing) => *existing = evite.clone(),
            None => evites.insert(0, evite.clone()),
        }
        self.write_unlocked(&evites)
    }

    /// Returns whether the evite was present.
    pub fn remove_one(&self, id: &str) -> Result<bool, CacheError> {
        let (_, dropped) = self.retain_and_read(|e| e.id != id)?;
        Ok(dropped > 0)
    }

    /// Keeps only the evites matching `keep` and returns them, along with how
    /// many were dropped. The slot is only rewritten when something was dropped.
    pub fn retain_and_read<F>(&self, keep: F) -> Result<(Vec<Evite>, usize), CacheError>
    where
        F: Fn(&Evite) -> bool,
    {
        let _guard = self.lock();
        let mut evites = self.read_unlocked();
        let before = evites.len();
        evites.retain(|e| keep(e));
        let dropped = before - evites.len();
        if dropped > 0 {
            self.write_unlocked(&evites)?;
        }
        Ok((evites, dropped))
    }
}
