//! Admin surface configuration

use super::EnvLookup;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub enabled: bool,
    /// Path prefix for every admin route, e.g. `/_admin/users`
    pub prefix: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { enabled: true, prefix: "/_admin/users".to_string() }
    }
}

impl AdminConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_from(&mut self, env: EnvLookup<'_>) {
        if let Some(enabled) = env("BASTION_ADMIN_ENABLED") {
            self.enabled = enabled.parse().unwrap_or(true);
        }
        if let Some(prefix) = env("BASTION_ADMIN_PREFIX") {
            self.prefix = prefix;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.prefix.starts_with('/') {
            bail!("admin.prefix must start with '/'");
        }
        if self.prefix.len() > 1 && self.prefix.ends_with('/') {
            bail!("admin.prefix must not end with '/'");
        }
        Ok(())
    }
}
