//! services/api/src/adapters/file_slot.rs
//!
//! A `DurableSlot` that keeps one JSON file per key under a data directory.
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash mid-write leaves the previous value readable.

use async_trait::async_trait;
use aura_core::ports::{DurableSlot, PortError, PortResult};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

#[derive(Clone, Debug)]
pub struct FileSlotAdapter {
    dir: PathBuf,
}

impl FileSlotAdapter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PortError::Unexpected(format!("Invalid slot key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl DurableSlot for FileSlotAdapter {
    async fn read(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn write(&self, key: &str, value: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to replace {}: {}", path.display(), e)))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}
