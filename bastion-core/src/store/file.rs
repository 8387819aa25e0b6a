//! JSON file backed user store

use super::{StoreError, StoreSnapshot, UserStore};
use std::path::{Path, PathBuf};

/// Reads roles and users from a JSON document on every fetch
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    name: String,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("json:{}", path.display());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl UserStore for JsonFileStore {
    async fn fetch(&self) -> Result<StoreSnapshot, StoreError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", self.path.display(), e)))?;

        let snapshot: StoreSnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Malformed(format!("{}: {}", self.path.display(), e)))?;

        log::debug!(
            "Read {} roles and {} users from {}",
            snapshot.roles.len(),
            snapshot.users.len(),
            self.path.display()
        );
        Ok(snapshot)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
