//! Configuration management for supervisord-exporter.
//!
//! This module handles loading and validating configuration from files.
//! It supports YAML, JSON, and TOML formats. CLI overrides are merged on top
//! by the binary.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::builder::MetricsSettings;
use crate::client::socket_path_from_endpoint;
use crate::error::ConfigError;
use crate::supervisord_conf::read_supervisord_conf;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9876;
pub const DEFAULT_ENDPOINT: &str = "unix:///var/run/supervisor.sock";
pub const DEFAULT_STATUS_PATH: &str = "/";
pub const DEFAULT_COLLECTION_INTERVAL: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 5;

const DEFAULT_LOCATIONS: [&str; 6] = [
    "/etc/supervisord-exporter/config.yaml",
    "/etc/supervisord-exporter/config.yml",
    "/etc/supervisord-exporter/config.json",
    "./supervisord-exporter.yaml",
    "./supervisord-exporter.yml",
    "./supervisord-exporter.json",
];

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // supervisord connection
    /// Socket address, e.g. `unix:///var/run/supervisor.sock`
    #[serde(alias = "supervisord-endpoint", alias = "unix-socket")]
    pub endpoint: Option<String>,
    #[serde(alias = "status-path")]
    pub status_path: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,

    // Scheduling
    #[serde(alias = "collection-interval-seconds")]
    pub collection_interval_seconds: Option<u64>,
    #[serde(alias = "request-timeout-seconds")]
    pub request_timeout_seconds: Option<u64>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,

    /// supervisord.conf to import the endpoint and credentials from
    #[serde(
        default,
        alias = "supervisord-config",
        alias = "supervisordd_config",
        skip_serializing_if = "Option::is_none"
    )]
    pub supervisord_config: Option<String>,

    // Metrics enable flags
    #[serde(default)]
    pub metrics: MetricsSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            status_path: Some(DEFAULT_STATUS_PATH.to_string()),
            username: None,
            password: None,
            collection_interval_seconds: Some(DEFAULT_COLLECTION_INTERVAL),
            request_timeout_seconds: Some(DEFAULT_REQUEST_TIMEOUT),
            log_level: Some("info".into()),
            enable_health: Some(true),
            supervisord_config: None,
            metrics: MetricsSettings::default(),
        }
    }
}

impl Config {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn status_path(&self) -> &str {
        self.status_path.as_deref().unwrap_or(DEFAULT_STATUS_PATH)
    }

    pub fn collection_interval(&self) -> Duration {
        Duration::from_secs(
            self.collection_interval_seconds
                .unwrap_or(DEFAULT_COLLECTION_INTERVAL),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
    }

    /// Basic-auth credentials, if configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }

    /// Overwrites endpoint and credentials with those found in the
    /// configured supervisord.conf. No-op when none is configured.
    pub fn import_supervisord_conf(&mut self) -> Result<(), ConfigError> {
        let Some(path) = self.supervisord_config.as_deref() else {
            return Ok(());
        };
        let imported = read_supervisord_conf(Path::new(path))?;
        info!("Imported supervisord settings from: {}", path);

        if let Some(endpoint) = imported.endpoint {
            self.endpoint = Some(endpoint);
        }
        if let (Some(user), Some(pass)) = (imported.username, imported.password) {
            self.username = Some(user);
            self.password = Some(pass);
        }
        Ok(())
    }

    /// Copy of the config safe to display.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.password.is_some() {
            cfg.password = Some("********".into());
        }
        cfg
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.collection_interval_seconds == Some(0) {
        return Err(ConfigError::ZeroDuration("collection_interval_seconds"));
    }
    if cfg.request_timeout_seconds == Some(0) {
        return Err(ConfigError::ZeroDuration("request_timeout_seconds"));
    }

    // Reachability of the socket is checked when the scraper starts.
    socket_path_from_endpoint(cfg.endpoint())?;

    if !cfg.metrics.any_enabled() {
        return Err(ConfigError::NoMetricsEnabled);
    }

    if cfg.username.is_some() != cfg.password.is_some() {
        return Err(ConfigError::IncompleteCredentials);
    }

    Ok(())
}

/// Finds the config file to load: the given path, else the first existing default location.
fn locate_config(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(p) => Some(p.to_path_buf()),
        None => DEFAULT_LOCATIONS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf),
    }
}

/// Loads configuration with multiple format support.
///
/// A missing file yields the default configuration.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match locate_config(path) {
        Some(p) if p.exists() => p,
        _ => return Ok(Config::default()),
    };

    let shown_path = path.display().to_string();
    let content = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
        path: shown_path.clone(),
        reason: e.to_string(),
    })?;
    let parse_err = |reason: String| ConfigError::Parse {
        path: shown_path.clone(),
        reason,
    };

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        Some("toml") => toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
    };
    info!("Loaded configuration from: {}", shown_path);
    Ok(config)
}

/// Renders configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_effective_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_unix_endpoint() {
        let cfg = Config {
            endpoint: Some("http://localhost:9001".into()),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::MissingUnixPrefix(_))
        ));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let cfg = Config {
            collection_interval_seconds: Some(0),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::ZeroDuration(_))
        ));
    }

    #[test]
    fn test_rejects_all_metrics_disabled() {
        let mut cfg = Config::default();
        cfg.metrics.process_count.enabled = false;
        cfg.metrics.process_uptime.enabled = false;
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::NoMetricsEnabled)
        ));
    }

    #[test]
    fn test_rejects_half_credentials() {
        let cfg = Config {
            username: Some("admin".into()),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::IncompleteCredentials)
        ));
    }

    #[test]
    fn test_load_yaml_with_metric_settings() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "endpoint: unix:///tmp/sv.sock\nusername: admin\npassword: secret\nmetrics:\n  supervisord.process.uptime:\n    enabled: false\n"
        )
        .unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.endpoint(), "unix:///tmp/sv.sock");
        assert_eq!(cfg.credentials(), Some(("admin", "secret")));
        assert!(cfg.metrics.process_count.enabled);
        assert!(!cfg.metrics.process_uptime.enabled);
        // Unset fields fall back through the accessors.
        assert_eq!(cfg.collection_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"port": 9999, "collection_interval_seconds": 30}}"#).unwrap();
        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.port, Some(9999));
        assert_eq!(cfg.collection_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_invalid_file_is_parse_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "{{ not json").unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let cfg = load_config(Some(Path::new("/nonexistent/supervisord-exporter.yaml"))).unwrap();
        assert_eq!(cfg.port, Some(DEFAULT_PORT));
    }

    #[test]
    fn test_import_supervisord_conf_overrides_connection() {
        let mut file = tempfile::Builder::new().suffix(".conf").tempfile().unwrap();
        writeln!(
            file,
            "[supervisorctl]\nserverurl=unix:///run/sv.sock\nusername=ctl\npassword=pw"
        )
        .unwrap();

        let mut cfg = Config {
            endpoint: Some("unix:///tmp/other.sock".into()),
            supervisord_config: Some(file.path().display().to_string()),
            ..Config::default()
        };
        cfg.import_supervisord_conf().unwrap();
        assert_eq!(cfg.endpoint(), "unix:///run/sv.sock");
        assert_eq!(cfg.credentials(), Some(("ctl", "pw")));
    }

    #[test]
    fn test_import_without_supervisord_conf_is_noop() {
        let mut cfg = Config::default();
        cfg.import_supervisord_conf().unwrap();
        assert_eq!(cfg.endpoint(), DEFAULT_ENDPOINT);

        cfg.supervisord_config = Some("/nonexistent/supervisord.conf".into());
        assert!(matches!(
            cfg.import_supervisord_conf(),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_redacted_hides_password() {
        let cfg = Config {
            username: Some("admin".into()),
            password: Some("secret".into()),
            ..Config::default()
        };
        let shown = render_config(&cfg.redacted(), ConfigFormat::Yaml).unwrap();
        assert!(!shown.contains("secret"));
        assert!(shown.contains("admin"));
    }
}
