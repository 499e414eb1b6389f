//! services/api/src/adapters/file_storage.rs
//!
//! A `KeyValueStorage` that keeps one JSON file per key in a data directory.
//! Backs the local-mode record backend when no database is configured.

use async_trait::async_trait;
use lifedeal_core::ports::{KeyValueStorage, PortError, PortResult};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PortError::Unexpected(format!(
                "'{}' is not a valid storage key",
                key
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn load(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unavailable(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Writes through a temporary file and renames it into place, so a reader
    /// never sees a half-written table.
    async fn save(&self, key: &str, value: String) -> PortResult<()> {
        let path = self.path_for(key)?;
        let unavailable =
            |e: std::io::Error| PortError::Unavailable(format!("Failed to write {}: {}", path.display(), e));

        tokio::fs::create_dir_all(&self.dir).await.map_err(unavailable)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await.map_err(unavailable)?;
        tokio::fs::rename(&tmp, &path).await.map_err(unavailable)?;

        debug!("Saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_keys_load_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert_eq!(storage.load("lifedeal-vault-deals").await.unwrap(), None);
    }

    #[tokio::test]
    async fn saved_values_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data");

        FileStorage::new(&nested)
            .save("lifedeal-vault-categories", "[]".to_string())
            .await
            .unwrap();

        let reopened = FileStorage::new(&nested);
        assert_eq!(
            reopened.load("lifedeal-vault-categories").await.unwrap(),
            Some("[]".to_string())
        );
        assert!(!nested.join("lifedeal-vault-categories.json.tmp").exists());
    }

    #[tokio::test]
    async fn keys_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(storage.load("../etc/passwd").await.is_err());
        assert!(storage.save("", "x".to_string()).await.is_err());
    }
}
