//! cronwatch-config: run configuration for the job monitor.
//!
//! Loads `~/.cronwatch/config.json5`, falling back to defaults when the
//! file is absent. Receiver lists are normalized here at the boundary;
//! the core never sees the single-address shorthand.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cronwatch_notify::MailerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
}

/// Monitor run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSection {
    /// Seconds after which a locked job counts as stuck.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
    /// Report receivers; accepts a single address or a list.
    #[serde(default, deserialize_with = "receiver_list")]
    pub receivers: Vec<String>,
    /// Mail the sentinel text even when everything is healthy.
    #[serde(default)]
    pub notify_when_healthy: bool,
}

fn default_lock_timeout_secs() -> u64 {
    3600
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            lock_timeout_secs: default_lock_timeout_secs(),
            receivers: Vec::new(),
            notify_when_healthy: false,
        }
    }
}

/// Top-level cronwatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronwatchConfig {
    /// Path to the scheduled-job database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Monitor run settings.
    #[serde(default)]
    pub monitor: MonitorSection,
    /// SMTP relay settings for report mails.
    #[serde(default)]
    pub mailer: MailerConfig,
}

fn default_db_path() -> PathBuf {
    config_dir()
        .map(|d| d.join("jobs.db"))
        .unwrap_or_else(|_| PathBuf::from("jobs.db"))
}

impl Default for CronwatchConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            monitor: MonitorSection::default(),
            mailer: MailerConfig::default(),
        }
    }
}

/// Accept either a single address or a list, then normalize.
fn receiver_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let raw = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(addr) => vec![addr],
        OneOrMany::Many(addrs) => addrs,
    };
    Ok(normalize_receivers(raw))
}

/// Trim, drop empties, and deduplicate keeping the first occurrence.
/// Addresses that do not look like mailboxes are kept but warned about;
/// the transport reports them per receiver at send time.
pub fn normalize_receivers(raw: Vec<String>) -> Vec<String> {
    let mut receivers: Vec<String> = Vec::new();
    for addr in raw {
        let addr = addr.trim().to_string();
        if addr.is_empty() || receivers.contains(&addr) {
            continue;
        }
        if !cronwatch_notify::is_valid_address(&addr) {
            tracing::warn!(receiver = %addr, "receiver does not look like a mail address");
        }
        receivers.push(addr);
    }
    receivers
}

/// Resolve the cronwatch config directory (~/.cronwatch/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".cronwatch"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.cronwatch/config.json5).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json5"))
}

/// Load configuration from the default path, falling back to defaults.
pub fn load_config() -> Result<CronwatchConfig, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let path = config_file_path()?;
    load_config_from(&path)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<CronwatchConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(CronwatchConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: CronwatchConfig = json5::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CronwatchConfig::default();
        assert_eq!(config.monitor.lock_timeout_secs, 3600);
        assert!(config.monitor.receivers.is_empty());
        assert!(!config.monitor.notify_when_healthy);
        assert_eq!(config.mailer.port, 587);
        assert!(config.db_path.ends_with("jobs.db"));
    }

    #[test]
    fn test_json5_parse() {
        let json5_str = r#"{
            db_path: "/var/lib/cronwatch/jobs.db",
            monitor: {
                lock_timeout_secs: 900,
                receivers: ["ops@example.com", "oncall@example.com"],
                notify_when_healthy: true,
            },
            mailer: { host: "mail.example.com", port: 25, use_tls: false },
        }"#;
        let config: CronwatchConfig = json5::from_str(json5_str).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/cronwatch/jobs.db"));
        assert_eq!(config.monitor.lock_timeout_secs, 900);
        assert_eq!(
            config.monitor.receivers,
            vec!["ops@example.com", "oncall@example.com"]
        );
        assert!(config.monitor.notify_when_healthy);
        assert_eq!(config.mailer.host, "mail.example.com");
        assert!(!config.mailer.use_tls);
    }

    #[test]
    fn test_single_receiver_shorthand() {
        let config: CronwatchConfig =
            json5::from_str(r#"{ monitor: { receivers: "ops@example.com" } }"#).unwrap();
        assert_eq!(config.monitor.receivers, vec!["ops@example.com"]);
    }

    #[test]
    fn test_receivers_trimmed_and_deduplicated() {
        let receivers = normalize_receivers(vec![
            " ops@example.com ".into(),
            "".into(),
            "oncall@example.com".into(),
            "ops@example.com".into(),
        ]);
        assert_eq!(receivers, vec!["ops@example.com", "oncall@example.com"]);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config_from(Path::new("/nonexistent/config.json5")).unwrap();
        assert!(config.monitor.receivers.is_empty());
        assert_eq!(config.monitor.lock_timeout_secs, 3600);
    }
}
