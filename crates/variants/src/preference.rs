use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::variant::Variant;

/// Logical name under which the chosen variant is stored.
pub const PREFERENCE_KEY: &str = "ui-version";

/// File name used by [`FileStore::in_dir`].
pub const PREFERENCE_FILE: &str = "preferences.toml";

/// A stored variant choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preference {
    Known(Variant),
    /// A value that matches no variant, e.g. written by a newer release.
    Unrecognized(String),
}

impl Preference {
    pub fn parse(raw: &str) -> Self {
        match Variant::from_id(raw) {
            Some(variant) => Preference::Known(variant),
            None => Preference::Unrecognized(raw.to_string()),
        }
    }

    pub fn variant(&self) -> Option<Variant> {
        match self {
            Preference::Known(variant) => Some(*variant),
            Preference::Unrecognized(_) => None,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            Preference::Known(variant) => variant.id(),
            Preference::Unrecognized(raw) => raw,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("failed to prepare preference directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write preference file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove preference file {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Storage for the variant choice. Writes are last-writer-wins and visible
/// to the next `get` immediately.
pub trait PreferenceStore {
    /// Absent when nothing was stored or the stored data is unreadable.
    fn get(&self) -> Option<Preference>;
    fn set(&self, variant: Variant) -> Result<(), PreferenceError>;
    fn clear(&self) -> Result<(), PreferenceError>;
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for &S {
    fn get(&self) -> Option<Preference> {
        (**self).get()
    }

    fn set(&self, variant: Variant) -> Result<(), PreferenceError> {
        (**self).set(variant)
    }

    fn clear(&self) -> Result<(), PreferenceError> {
        (**self).clear()
    }
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for Rc<S> {
    fn get(&self) -> Option<Preference> {
        (**self).get()
    }

    fn set(&self, variant: Variant) -> Result<(), PreferenceError> {
        (**self).set(variant)
    }

    fn clear(&self) -> Result<(), PreferenceError> {
        (**self).clear()
    }
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: RefCell<Option<String>>,
    writes: RefCell<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with an arbitrary raw value.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            value: RefCell::new(Some(raw.into())),
            writes: RefCell::new(0),
        }
    }

    /// Number of successful `set` calls.
    pub fn writes(&self) -> u32 {
        *self.writes.borrow()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self) -> Option<Preference> {
        self.value.borrow().as_deref().map(Preference::parse)
    }

    fn set(&self, variant: Variant) -> Result<(), PreferenceError> {
        *self.value.borrow_mut() = Some(variant.id().to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn clear(&self) -> Result<(), PreferenceError> {
        self.value.borrow_mut().take();
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(rename = "ui-version", default, skip_serializing_if = "Option::is_none")]
    ui_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// TOML-backed store scoped to one file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PREFERENCE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time of the last successful `set`, if recorded.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.read().and_then(|file| file.updated_at)
    }

    fn read(&self) -> Option<PreferenceFile> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to read preference file; treating as absent"
                );
                return None;
            }
        };
        match toml::from_str(&contents) {
            Ok(file) => Some(file),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "malformed preference file; treating as absent"
                );
                None
            }
        }
    }
}

impl PreferenceStore for FileStore {
    fn get(&self) -> Option<Preference> {
        let raw = self.read()?.ui_version?;
        let preference = Preference::parse(&raw);
        if let Preference::Unrecognized(value) = &preference {
            debug!(path = %self.path.display(), value = %value, "stored preference names no known variant");
        }
        Some(preference)
    }

    fn set(&self, variant: Variant) -> Result<(), PreferenceError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| PreferenceError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let file = PreferenceFile {
            ui_version: Some(variant.id().to_string()),
            updated_at: Some(Utc::now()),
        };
        let serialized = toml::to_string_pretty(&file)?;
        fs::write(&self.path, serialized).map_err(|source| PreferenceError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), variant = variant.id(), "stored preference");
        Ok(())
    }

    fn clear(&self) -> Result<(), PreferenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PreferenceError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.get(), None);
        store.set(Variant::Creator).unwrap();
        assert_eq!(store.get(), Some(Preference::Known(Variant::Creator)));
        store.set(Variant::Messenger).unwrap();
        assert_eq!(store.get(), Some(Preference::Known(Variant::Messenger)));
        assert_eq!(store.writes(), 2);
        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn file_store_round_trips_and_records_timestamp() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(&dir.path().join("nested"));
        assert_eq!(store.get(), None);

        let before = Utc::now();
        store.set(Variant::Creator).unwrap();
        assert_eq!(store.get(), Some(Preference::Known(Variant::Creator)));
        assert!(store.updated_at().unwrap() >= before);

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("ui-version = \"1.0.1\""));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn malformed_file_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(dir.path());
        fs::write(store.path(), "ui-version = [not toml").unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn unknown_value_is_reported_as_unrecognized() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(dir.path());
        fs::write(store.path(), "ui-version = \"9.9.9\"\n").unwrap();
        assert_eq!(
            store.get(),
            Some(Preference::Unrecognized("9.9.9".to_string()))
        );
    }

    #[test]
    fn file_without_the_key_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(dir.path());
        fs::write(store.path(), "# nothing yet\n").unwrap();
        assert_eq!(store.get(), None);
    }
}
