//! supervisord exporter library
//!
//! Polls a local supervisord daemon over its unix socket and turns the status
//! of every supervised process into time-stamped metric batches.
//!
//! # Components
//!
//! - **Status client** ([`client`]): one HTTP request per call over the unix
//!   socket, decoded into [`ProcessRecord`]s.
//! - **Metrics builder** ([`builder`]): per-metric accumulators with
//!   enablement, capacity hints and a fixed start-time baseline.
//! - **Scraper** ([`scraper`]): drives fetch, transform and emit for one cycle.
//!
//! # Usage
//!
//! ```no_run
//! use supervisord_exporter::{BuildInfo, Config, SupervisordScraper};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     endpoint: Some("unix:///var/run/supervisor.sock".into()),
//!     ..Config::default()
//! };
//!
//! let mut scraper = SupervisordScraper::new(config, BuildInfo::default());
//! scraper.start()?;
//!
//! let metrics = scraper.scrape().await?;
//! for metric in metrics.iter_metrics() {
//!     println!("{}: {} points", metric.name, metric.points.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod health_stats;
pub mod scraper;
pub mod stats;
pub mod supervisord_conf;

// Re-export main types for convenience
pub use builder::{BuildInfo, Metrics, MetricsBuilder, MetricsSettings, Timestamp};
pub use client::StatusClient;
pub use config::Config;
pub use error::{ClientError, ConfigError, ScrapeError};
pub use health_stats::ScrapeStats;
pub use scraper::SupervisordScraper;
pub use stats::ProcessRecord;
