pub mod check;
pub mod serve;

use anyhow::{bail, Result};
use bastion_core::config::BastionConfig;
use std::path::Path;

/// Load config from `path`, or from `./bastion.toml` if none was given.
///
/// An explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<BastionConfig> {
    match path {
        Some(path) if !path.exists() => bail!("config file {} does not exist", path.display()),
        Some(path) => BastionConfig::load_from(path),
        None => BastionConfig::load(),
    }
}
