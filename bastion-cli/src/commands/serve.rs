use anyhow::{Context, Result};
use bastion_core::admin::USER_HEADER;
use bastion_core::config::BastionConfig;
use bastion_core::logging::init_logging;
use bastion_core::{server, UserManager};
use std::path::Path;
use std::sync::Arc;

/// Load config, build the user manager and serve until Ctrl-C.
pub async fn run(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate().context("Invalid configuration")?;

    init_logging(&config.logging);

    let manager = Arc::new(UserManager::from_config(&config)?);
    if config.storage.load_on_startup {
        // an unreadable database leaves the registry empty, which denies everything
        if let Err(e) = manager.load_user().await {
            log::warn!("Starting without a user database: {}", e);
        }
    }

    if let Some(warning) = trusted_header_warning(&config) {
        log::warn!("{}", warning);
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    server::serve(manager, &config, shutdown).await
}

/// The admin surface trusts the identity header as sent
fn trusted_header_warning(config: &BastionConfig) -> Option<String> {
    config.admin.enabled.then(|| {
        format!(
            "Admin callers are identified by the '{}' header alone; only expose {} behind a proxy that authenticates and sets it",
            USER_HEADER, config.admin.prefix
        )
    })
}
