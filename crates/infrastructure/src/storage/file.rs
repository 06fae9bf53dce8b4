//! JSON file storage.
//!
//! The whole key/value map lives in one JSON object. Every write replaces
//! the file through a temporary file and a rename, so readers in other
//! processes see either the old or the new map, never a mix.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use sea_application::ports::{KeyValueStorage, StorageError};

/// File-backed storage for the command-line client.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens the file at `path`, creating it on first write.
    ///
    /// An unreadable or malformed file is treated as empty; the next write
    /// replaces it.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|error| {
                tracing::warn!(path = %path.display(), error = %error, "Session file is malformed, starting empty");
                BTreeMap::new()
            }),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "Session file is unreadable, starting empty");
                BTreeMap::new()
            }
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Default location: `<config dir>/sea/session.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sea").join("session.json"))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to a copy of the map, persists it, then commits it.
    fn write(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let mut values = self.values.lock();
        let mut next = values.clone();
        change(&mut next);
        if next == *values {
            return Ok(());
        }
        persist(&self.path, &next)?;
        *values = next;
        Ok(())
    }
}

fn persist(path: &Path, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
    let json =
        serde_json::to_vec_pretty(values).map_err(|e| StorageError::Serialization(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp_path).map_err(|e| StorageError::Io(e.to_string()))?;
    restrict_permissions(&file)?;
    file.write_all(&json)
        .and_then(|()| file.sync_all())
        .map_err(|e| StorageError::Io(e.to_string()))?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(|e| StorageError::Io(e.to_string()))
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
        .map_err(|e| StorageError::Io(e.to_string()))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> Result<(), StorageError> {
    Ok(())
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.write(|values| {
            values.remove(key);
        })
    }

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let values = self.values.lock();
        Ok(keys.iter().map(|key| values.get(*key).cloned()).collect())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.write(|values| {
            for (key, value) in entries {
                values.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.write(|values| {
            for key in keys {
                values.remove(*key);
            }
        })
    }
}
