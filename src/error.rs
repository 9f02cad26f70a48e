//! Error types for the scrape-and-build engine.
//!
//! Configuration errors are fatal to [`crate::scraper::SupervisordScraper::start`].
//! Client errors are fatal to a single scrape cycle only. Field-level parse
//! problems never surface here; they are logged and absorbed by the scraper.

/// Invalid or unusable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("endpoint '{0}' must use the unix prefix (unix:///path/to/supervisor.sock)")]
    MissingUnixPrefix(String),

    #[error("endpoint '{0}' does not name a socket path")]
    EmptySocketPath(String),

    #[error("supervisord socket {path} is not reachable: {reason}")]
    UnreachableSocket { path: String, reason: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("at least one of supervisord.process.count/supervisord.process.uptime must be enabled")]
    NoMetricsEnabled,

    #[error("username and password must be set together")]
    IncompleteCredentials,

    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Failure of a single status exchange with supervisord.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error talking to {host}: {reason}")]
    Transport { host: String, reason: String },

    #[error("supervisord at {host} answered with status {status}")]
    Status { host: String, status: u16 },

    #[error("malformed response from {host}: {reason}")]
    MalformedResponse { host: String, reason: String },

    #[error("failed to decode status response: {0}")]
    Decode(String),
}

/// Error returned by a scrape cycle or by scraper start-up.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("client not initialized")]
    NotInitialized,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),
}
