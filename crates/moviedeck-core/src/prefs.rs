//! Named string slots persisted between runs.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};

/// File name of the preference store inside the data directory.
pub const PREFS_FILE_NAME: &str = "prefs.toml";

/// Key-value storage for small string preferences.
pub trait PreferenceStore: Send + Sync + fmt::Debug {
    /// Returns the value stored under `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, slot: &str) -> Result<Option<String>>;

    /// Stores `value` under `slot`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, slot: &str, value: &str) -> Result<()>;

    /// Removes `slot`. Removing an absent slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, slot: &str) -> Result<()>;
}

/// Preferences stored as a flat TOML table.
///
/// The file is re-read on every access; a missing file reads as empty.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    /// Uses the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `{dir}/prefs.toml`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PREFS_FILE_NAME))
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn write_all(&self, slots: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(slots).context("failed to serialize preferences")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, slot: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(slot))
    }

    fn set(&self, slot: &str, value: &str) -> Result<()> {
        let mut slots = self.read_all()?;
        slots.insert(String::from(slot), String::from(value));
        self.write_all(&slots)
    }

    fn remove(&self, slot: &str) -> Result<()> {
        let mut slots = self.read_all()?;
        if slots.remove(slot).is_none() {
            return Ok(());
        }
        self.write_all(&slots)
    }
}

/// In-process preferences, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    slots: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_slots<T>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> Result<T> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("preference store lock poisoned"))?;
        Ok(f(&mut slots))
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, slot: &str) -> Result<Option<String>> {
        self.with_slots(|slots| slots.get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str) -> Result<()> {
        self.with_slots(|slots| {
            slots.insert(String::from(slot), String::from(value));
        })
    }

    fn remove(&self, slot: &str) -> Result<()> {
        self.with_slots(|slots| {
            slots.remove(slot);
        })
    }
}
