//! Key-value persistence for small application state.
//!
//! Values are opaque bytes, read and written whole. There is no partial
//! update and no versioning.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::error::StorageError;

/// A flat map from string keys to byte values.
pub trait KeyValueStore {
    /// Read the value stored under `key`, `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the value stored under `key`.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError>;
}

/// Keeps every key in one file inside a directory.
///
/// Writes land in a temporary file that is renamed over the old value, so a
/// reader sees either the previous or the new value, never a mix.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn write(&self, key: &str, value: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path(key);
        let temp = self.dir.join(format!(".{key}.json.tmp"));

        let mut file = fs::File::create(&temp)?;
        file.write_all(value)?;
        file.sync_all()?;

        fs::rename(&temp, &path)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.write(key, value).map_err(|source| StorageError::Write {
            key: key.to_string(),
            source,
        })?;

        log::debug!("Stored {} bytes under '{key}' in {}", value.len(), self.dir.display());

        Ok(())
    }
}

/// In-memory store, lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
