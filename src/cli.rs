//! CLI arguments and subcommands for supervisord-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! and merges CLI overrides on top of the loaded configuration.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

use supervisord_exporter::config::{load_config, Config, ConfigFormat};

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parses a level name as used in config files.
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "supervisord-exporter",
    about = "Prometheus exporter for supervisord process metrics",
    long_about = "Prometheus exporter for supervisord process metrics.\n\n\
                  Polls supervisord over its unix socket on a fixed interval and exposes \
                  the number of supervised processes and the uptime of each one.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// supervisord socket address (unix:///path/to/supervisor.sock)
    #[arg(short = 'e', long)]
    pub endpoint: Option<String>,

    /// supervisord.conf to import the socket and credentials from
    #[arg(long)]
    pub supervisord_config: Option<PathBuf>,

    /// Request path sent to supervisord
    #[arg(long)]
    pub status_path: Option<String>,

    /// Basic-auth user for supervisord
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Basic-auth password for supervisord
    #[arg(long)]
    pub password: Option<String>,

    /// Seconds between scrapes
    #[arg(long)]
    pub interval: Option<u64>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Do not report supervisord.process.count
    #[arg(long)]
    pub disable_process_count: bool,

    /// Do not report supervisord.process.uptime
    #[arg(long)]
    pub disable_process_uptime: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and check the supervisord socket
    Check {
        /// Also run one scrape cycle against supervisord
        #[arg(long)]
        scrape: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// Run scrape cycles once and print the emitted points
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Show every data point
        #[arg(long)]
        verbose: bool,
    },
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > supervisord.conf > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    // Connection settings: supervisord.conf first, explicit flags on top
    if let Some(path) = &args.supervisord_config {
        config.supervisord_config = Some(path.display().to_string());
    }
    config.import_supervisord_conf()?;

    if let Some(endpoint) = &args.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(path) = &args.status_path {
        config.status_path = Some(path.clone());
    }
    if let Some(user) = &args.username {
        config.username = Some(user.clone());
    }
    if let Some(pass) = &args.password {
        config.password = Some(pass.clone());
    }

    // Scheduling
    if let Some(interval) = args.interval {
        config.collection_interval_seconds = Some(interval);
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_seconds = Some(timeout);
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_process_count {
        config.metrics.process_count.enabled = false;
    }
    if args.disable_process_uptime {
        config.metrics.process_uptime.enabled = false;
    }

    Ok(config)
}

/// Effective log level: CLI > config file > info.
pub fn effective_log_level(config: &Config, args: &Args) -> LogLevel {
    args.log_level
        .or_else(|| config.log_level.as_deref().and_then(LogLevel::from_name))
        .unwrap_or(LogLevel::Info)
}
