use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use super::CartState;

/// Fixed key the persisted cart lives under.
pub const CART_STORAGE_KEY: &str = "cart.json";

#[derive(Debug, Error)]
pub enum CartStorageError {
    #[error("cart storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persisted cart is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("cart storage lock poisoned")]
    Poisoned,
}

/// Where a cart session is persisted between runs.
pub trait CartStorage: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<CartState>, CartStorageError>;
    fn save(&self, state: &CartState) -> Result<(), CartStorageError>;
}

/// Keeps the serialized cart as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileCartStorage {
    path: PathBuf,
}

impl JsonFileCartStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at `<dir>/cart.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CART_STORAGE_KEY))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for JsonFileCartStorage {
    fn load(&self) -> Result<Option<CartState>, CartStorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, state: &CartState) -> Result<(), CartStorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string(state)?;
        // write then rename so a crash never leaves a half-written cart
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Raw JSON kept in memory; useful for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with an arbitrary payload, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<CartState>, CartStorageError> {
        let slot = self.slot.lock().map_err(|_| CartStorageError::Poisoned)?;
        match slot.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &CartState) -> Result<(), CartStorageError> {
        let payload = serde_json::to_string(state)?;
        let mut slot = self.slot.lock().map_err(|_| CartStorageError::Poisoned)?;
        *slot = Some(payload);
        Ok(())
    }
}
