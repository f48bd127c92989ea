//! Directory-backed medium.
//!
//! Each key maps to `<dir>/<key>.db`. Writes go to a temporary sibling that
//! is fsynced and then renamed over the target, so a failed or interrupted
//! write leaves the previous blob intact.

use super::traits::{KeyValueMedium, MediumError};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const BLOB_EXTENSION: &str = "db";
const TMP_EXTENSION: &str = "db.tmp";

/// Persistent medium storing one file per key inside a directory.
#[derive(Debug, Clone)]
pub struct DirectoryMedium {
    dir: PathBuf,
}

impl DirectoryMedium {
    /// Open (creating if needed) the directory at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, MediumError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the blobs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, MediumError> {
        Self::check_key(key)?;
        Ok(self.dir.join(format!("{}.{}", key, BLOB_EXTENSION)))
    }

    fn check_key(key: &str) -> Result<(), MediumError> {
        let ok = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if ok {
            Ok(())
        } else {
            Err(MediumError::InvalidKey(key.to_string()))
        }
    }
}

impl KeyValueMedium for DirectoryMedium {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, MediumError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), MediumError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!("{}.{}", key, TMP_EXTENSION));

        let result = (|| {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(target: "tablestore::storage", path = ?path, bytes = bytes.len(), "directory write");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn medium_id(&self) -> &str {
        "directory"
    }
}
