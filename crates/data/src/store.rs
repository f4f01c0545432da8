use lixi_core::{KeyValueStore, StoreError};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub fn default_store_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("LIXI_STORE") {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".lixi_store.json"))
}

/// Key/value store kept as one JSON object on disk. Every write replaces the
/// file through a sibling temp file and a rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let body = match fs::read_to_string(&self.path) {
            Ok(body) => body,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(unavailable(&self.path, err)),
        };
        if body.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&body).map_err(|err| StoreError::Corrupt {
            key: self.path.display().to_string(),
            reason: err.to_string(),
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(entries).map_err(|err| StoreError::Corrupt {
            key: self.path.display().to_string(),
            reason: err.to_string(),
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| unavailable(parent, err))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|err| unavailable(&tmp, err))?;
        fs::rename(&tmp, &self.path).map_err(|err| unavailable(&self.path, err))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }
}

fn unavailable(path: &Path, err: io::Error) -> StoreError {
    StoreError::Unavailable(format!("{}: {err}", path.display()))
}
