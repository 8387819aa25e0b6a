use anyhow::{Context, Result};
use bastion_core::logging::init_logging;
use bastion_core::UserManager;
use std::path::Path;

/// Fetch and validate the configured user database; returns `(roles, users)`.
pub async fn run(config_path: Option<&Path>) -> Result<(usize, usize)> {
    let config = super::load_config(config_path)?;
    init_logging(&config.logging);

    let manager = UserManager::from_config(&config)?;
    let (roles, users) = manager
        .reload_controller()
        .check()
        .await
        .with_context(|| format!("User database {} is invalid", config.storage.user_database))?;

    println!(
        "{}: {} roles, {} users, OK",
        config.storage.user_database, roles, users
    );
    Ok((roles, users))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(dir: &Path, database: &Path) -> std::path::PathBuf {
        let path = dir.join("bastion.toml");
        fs::write(
            &path,
            format!("[storage]\nuser_database = {:?}\nload_timeout_ms = 1000\n", database.display().to_string()),
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn check_valid_database() {
        let tmp = tempfile::tempdir().unwrap();
        let database = tmp.path().join("users.json");
        fs::write(
            &database,
            r#"{"roles": [{"name": "editor", "rights": ["read", "write"], "manage_right": "manage-users"}],
                "users": [{"name": "alice", "role": "editor"}]}"#,
        )
        .unwrap();

        let config = write_config(tmp.path(), &database);
        assert_eq!(run(Some(config.as_path())).await.unwrap(), (1, 1));
    }

    #[tokio::test]
    async fn check_dangling_user_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let database = tmp.path().join("users.json");
        fs::write(&database, r#"{"roles": [], "users": [{"name": "alice", "role": "editor"}]}"#).unwrap();

        let config = write_config(tmp.path(), &database);
        let err = run(Some(config.as_path())).await.unwrap_err();
        assert!(format!("{:#}", err).contains("unknown role 'editor'"));
    }

    #[tokio::test]
    async fn check_missing_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(run(Some(tmp.path().join("absent.toml").as_path())).await.is_err());
    }
}
