//! Configuration system for Bastion
//!
//! # Configuration Hierarchy
//!
//! Values are resolved in the following order (highest priority wins):
//!
//! 1. **Code / CLI flags** - applied by the caller after loading
//! 2. **Environment Variables** (`BASTION_*`) - override file config
//! 3. **Config File** (bastion.toml) - override defaults
//! 4. **Defaults** - lowest priority
//!
//! Every section is optional in the file; missing fields keep their defaults.
//!
//! # Example
//!
//! ```no_run
//! use bastion_core::config::BastionConfig;
//!
//! let config = BastionConfig::load()?;
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod admin;
pub mod logging;
pub mod rights;
pub mod server;
pub mod storage;

pub use admin::AdminConfig;
pub use logging::LoggingConfig;
pub use rights::RightsConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "bastion.toml";

/// Environment lookup used by `apply_env_*`; real runs read `std::env`
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Complete Bastion configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BastionConfig {
    pub server: ServerConfig,
    pub rights: RightsConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

impl BastionConfig {
    /// Load configuration with full supersedence chain from `bastion.toml`
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file (skipped if it does not exist)
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.server.merge(other.server);
        self.rights.merge(other.rights);
        self.storage.merge(other.storage);
        self.admin.merge(other.admin);
        self.logging.merge(other.logging);
    }

    /// Apply `BASTION_*` environment variables
    pub fn apply_env_vars(&mut self) {
        self.apply_env_from(&|key: &str| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary environment lookup
    pub fn apply_env_from(&mut self, env: EnvLookup<'_>) {
        self.server.apply_env_from(env);
        self.rights.apply_env_from(env);
        self.storage.apply_env_from(env);
        self.admin.apply_env_from(env);
        self.logging.apply_env_from(env);
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.rights.validate()?;
        self.storage.validate()?;
        self.admin.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
