use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};
use crate::models::TaskEntry;

/// Storage key holding the whole task collection.
pub const TASKS_KEY: &str = "design-tasks-log";
/// Storage key holding the AI vendor credential.
pub const API_KEY_KEY: &str = "claude-api-key";
/// Version written by this build.
pub const SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed at `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stored data at `{path}` is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored data at `{path}` has schema version {version}, newer than supported version {}", SCHEMA_VERSION)]
    UnsupportedVersion { path: PathBuf, version: u64 },
    #[error("failed to serialize task log: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported schema version {0}")]
    UnsupportedVersion(u64),
}

/// Returns the directory holding all storage keys.
///
/// The path is determined in the following order:
/// 1. `DESIGNLOG_DATA_DIR` environment variable.
/// 2. `~/.local/share/designlog` (on Linux).
/// 3. `./designlog` (fallback).
pub fn data_dir() -> PathBuf {
    std::env::var("DESIGNLOG_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("designlog");
        p
    })
}

/// A directory-backed key-value store: one file per key.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    /// Opens (creating if needed) storage rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir.clone(), source })?;
        Ok(LocalStorage { dir })
    }

    /// Opens storage at [`data_dir`].
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Reads a key. Returns `None` if it was never written.
    pub fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// Writes a key, replacing any previous value.
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| StoreError::Io { path: path.clone(), source })?;
        f.write_all(value.as_bytes())
            .map_err(|source| StoreError::Io { path, source })
    }

    /// Deletes a key. Removing a missing key is not an error.
    pub fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

/// On-disk shape of the task collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PersistedLog {
    pub version: u64,
    pub tasks: Vec<TaskEntry>,
}

/// Upgrades any known stored shape to the current [`PersistedLog`].
///
/// Version 0 is the unversioned bare array of entries.
pub fn migrate(raw: Value) -> Result<PersistedLog, MigrationError> {
    if raw.is_array() {
        let tasks: Vec<TaskEntry> = serde_json::from_value(raw)?;
        debug!("migrating {} entries from unversioned log", tasks.len());
        return Ok(PersistedLog { version: SCHEMA_VERSION, tasks });
    }
    let Some(map) = raw.as_object() else {
        return Err(MigrationError::Malformed(serde::de::Error::custom(format!(
            "expected an array or object, found {}",
            json_kind(&raw)
        ))));
    };
    let version = map.get("version").and_then(Value::as_u64).unwrap_or(0);
    if version > SCHEMA_VERSION {
        return Err(MigrationError::UnsupportedVersion(version));
    }
    let mut log: PersistedLog = serde_json::from_value(raw)?;
    log.version = SCHEMA_VERSION;
    Ok(log)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Loads all entries from storage.
///
/// Returns an empty vector if nothing was stored yet. Unreadable or corrupt
/// data is an error; it is never silently replaced.
pub fn load_entries(storage: &LocalStorage) -> Result<Vec<TaskEntry>, StoreError> {
    let path = storage.path_for(TASKS_KEY);
    let Some(s) = storage.get_item(TASKS_KEY)? else {
        return Ok(Vec::new());
    };
    let raw: Value = serde_json::from_str(&s).map_err(|source| {
        error!("task log at {} is not valid JSON", path.display());
        StoreError::Corrupt { path: path.clone(), source }
    })?;
    let log = migrate(raw).map_err(|e| match e {
        MigrationError::Malformed(source) => StoreError::Corrupt { path: path.clone(), source },
        MigrationError::UnsupportedVersion(version) => StoreError::UnsupportedVersion { path: path.clone(), version },
    })?;
    info!("loaded {} entries from {}", log.tasks.len(), path.display());
    Ok(log.tasks)
}

/// Saves the given entries, overwriting the stored collection.
pub fn save_entries(storage: &LocalStorage, tasks: &[TaskEntry]) -> Result<(), StoreError> {
    let log = PersistedLog { version: SCHEMA_VERSION, tasks: tasks.to_vec() };
    let s = serde_json::to_string_pretty(&log).map_err(StoreError::Serialize)?;
    storage.set_item(TASKS_KEY, &s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get_item("nothing").unwrap(), None);
        storage.remove_item("nothing").unwrap();
    }

    #[test]
    fn set_get_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path().join("nested")).unwrap();
        storage.set_item("k", "first value").unwrap();
        storage.set_item("k", "v2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v2"));
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn migrate_rejects_newer_versions() {
        let raw = json!({ "version": 7, "tasks": [] });
        assert!(matches!(migrate(raw), Err(MigrationError::UnsupportedVersion(7))));
    }

    #[test]
    fn migrate_rejects_scalars() {
        assert!(matches!(migrate(json!("hello")), Err(MigrationError::Malformed(_))));
    }

    #[test]
    fn migrate_upgrades_bare_array() {
        let raw = json!([{
            "id": "k3j9x0abc",
            "name": "Onboarding",
            "roughImage": "data:image/png;base64,AAAA",
            "finalImage": null,
            "notes": "",
            "aiDescription": "",
            "date": "2024-03-06T12:00:00.000Z",
            "createdAt": "2024-03-06T12:05:00.000Z"
        }]);
        let log = migrate(raw).unwrap();
        assert_eq!(log.version, SCHEMA_VERSION);
        assert_eq!(log.tasks.len(), 1);
        assert_eq!(log.tasks[0].name, "Onboarding");
        assert!(log.tasks[0].final_image.is_none());
    }
}
