//! Right universe configuration
//!
//! The universe is an ordered list: position `i` becomes bit `i` of every
//! right set. Reordering the list changes the meaning of stored bitmasks.

use super::EnvLookup;
use crate::rights::{RightUniverse, DEFAULT_RIGHTS, MAX_RIGHTS};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RightsConfig {
    /// Ordered right names
    pub universe: Vec<String>,
    /// Rights held by unauthenticated sessions
    pub anonymous: Vec<String>,
    /// Right that bypasses the escalation guard on the admin surface
    pub superuser: String,
}

impl Default for RightsConfig {
    fn default() -> Self {
        Self {
            universe: DEFAULT_RIGHTS.iter().map(|s| s.to_string()).collect(),
            anonymous: Vec::new(),
            superuser: "superuser".to_string(),
        }
    }
}

impl RightsConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_from(&mut self, env: EnvLookup<'_>) {
        if let Some(list) = env("BASTION_ANONYMOUS_RIGHTS") {
            self.anonymous = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.universe.is_empty() {
            bail!("rights.universe must name at least one right");
        }
        if self.universe.len() > MAX_RIGHTS {
            bail!("rights.universe has {} names, at most {} are supported", self.universe.len(), MAX_RIGHTS);
        }

        let mut seen = HashSet::new();
        for name in &self.universe {
            if !seen.insert(name.trim().to_lowercase()) {
                bail!("rights.universe lists '{}' twice", name);
            }
        }

        let known = |name: &str| seen.contains(&name.trim().to_lowercase());
        if !known(&self.superuser) {
            bail!("rights.superuser '{}' is not in rights.universe", self.superuser);
        }
        for name in &self.anonymous {
            if !known(name) {
                bail!("rights.anonymous names unknown right '{}'", name);
            }
        }
        Ok(())
    }

    /// Build the right universe described by this section
    pub fn universe(&self) -> Result<RightUniverse> {
        Ok(RightUniverse::new(&self.universe)?)
    }
}
