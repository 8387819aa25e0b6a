//! User database configuration

use super::EnvLookup;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON document with roles and users
    pub user_database: String,
    pub load_timeout_ms: u64,
    /// Load the user database before serving
    pub load_on_startup: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            user_database: "./data/users.json".to_string(),
            load_timeout_ms: 5000,
            load_on_startup: true,
        }
    }
}

impl StorageConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_from(&mut self, env: EnvLookup<'_>) {
        if let Some(path) = env("BASTION_USER_DATABASE") {
            self.user_database = path;
        }
        if let Some(timeout) = env("BASTION_LOAD_TIMEOUT_MS") {
            match timeout.parse() {
                Ok(ms) => self.load_timeout_ms = ms,
                Err(_) => log::warn!("Ignoring invalid BASTION_LOAD_TIMEOUT_MS value '{}'", timeout),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.load_timeout_ms == 0 {
            bail!("storage.load_timeout_ms must be greater than zero");
        }
        if self.user_database.trim().is_empty() {
            bail!("storage.user_database must not be empty");
        }
        Ok(())
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}
