//! services/api/src/adapters/file_store.rs
//!
//! The durable storage adapter. Implements the `KeyValueStore` port by keeping
//! one JSON file per key inside a data directory.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use plant_doctor_core::ports::{KeyValueStore, PortError, PortResult};
use tracing::debug;

/// A file-backed `KeyValueStore`. Values are replaced via temp file + rename.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates, if needed) the data directory.
    pub fn open(dir: impl Into<PathBuf>) -> PortResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            PortError::Unexpected(format!("failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    /// Keys become file names, so only a conservative character set is accepted.
    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PortError::Unexpected(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PortResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> PortResult<()> {
        let path = self.path_for(key)?;
        let tmp_path = self.dir.join(format!(".{}.json.tmp", key));
        let io_err =
            |e: std::io::Error| PortError::Unexpected(format!("failed to write {}: {}", key, e));

        let mut tmp_file = File::create(&tmp_path).map_err(io_err)?;
        tmp_file.write_all(value).map_err(io_err)?;
        // Ensure data is on disk before the rename makes it visible.
        tmp_file.sync_all().map_err(io_err)?;
        drop(tmp_file);

        fs::rename(&tmp_path, &path).map_err(io_err)?;
        debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(format!(
                "failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
