//! Process logging setup
//!
//! Everything in the crate logs through the standard `log` macros; this module
//! only installs the backend. `RUST_LOG`, when set, takes precedence over the
//! configured level so a single module can be turned up without editing
//! `bastion.toml`.

use crate::config::LoggingConfig;
use log::Record;
use serde_json::Value;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the global logger from config.
///
/// Safe to call more than once; only the first call installs a logger.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter_spec(&config.level, std::env::var("RUST_LOG").ok()));

        if config.is_json() {
            builder.format(|buf, record| writeln!(buf, "{}", json_line(record)));
        }

        if let Err(e) = builder.try_init() {
            eprintln!("Logger already installed, keeping it: {}", e);
        }
    });
}

/// Filter directives: a non-blank `RUST_LOG` replaces the configured level
fn filter_spec(level: &str, rust_log: Option<String>) -> String {
    match rust_log {
        Some(filters) if !filters.trim().is_empty() => filters,
        _ => level.to_string(),
    }
}

/// One record as a single JSON object
fn json_line(record: &Record<'_>) -> Value {
    serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "level": record.level().as_str(),
        "target": record.target(),
        "message": record.args().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_rust_log_overrides_configured_level() {
        assert_eq!(filter_spec("info", None), "info");
        assert_eq!(filter_spec("info", Some("  ".to_string())), "info");
        assert_eq!(
            filter_spec("info", Some("bastion_core::admin=debug".to_string())),
            "bastion_core::admin=debug"
        );
    }

    #[test]
    fn test_json_line_fields() {
        let line = json_line(
            &Record::builder()
                .args(format_args!("Deleted role '{}'", "editor"))
                .level(Level::Warn)
                .target("bastion_core::rbac")
                .build(),
        );

        assert_eq!(line["level"], "WARN");
        assert_eq!(line["target"], "bastion_core::rbac");
        assert_eq!(line["message"], "Deleted role 'editor'");
        let timestamp = line["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());

        let rendered = line.to_string();
        assert!(!rendered.contains('\n'));
        assert!(serde_json::from_str::<Value>(&rendered).is_ok());
    }
}
