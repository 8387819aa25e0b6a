//! Logging configuration

use super::EnvLookup;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const FORMATS: [&str; 2] = ["human", "json"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `human` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "human".to_string() }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_from(&mut self, env: EnvLookup<'_>) {
        if let Some(level) = env("BASTION_LOG_LEVEL") {
            self.level = level.to_lowercase();
        }
        if let Some(format) = env("BASTION_LOG_FORMAT") {
            self.format = format.to_lowercase();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !LEVELS.contains(&self.level.as_str()) {
            bail!("logging.level '{}' is not one of {}", self.level, LEVELS.join(", "));
        }
        if !FORMATS.contains(&self.format.as_str()) {
            bail!("logging.format '{}' is not one of {}", self.format, FORMATS.join(", "));
        }
        Ok(())
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}
