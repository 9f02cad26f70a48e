//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers and updated by the background scrape task.

use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};

use supervisord_exporter::{Config, Metrics, ScrapeStats};

use crate::metrics::ExporterMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests and the scrape task.
pub struct AppState {
    pub registry: Registry,
    pub metrics: ExporterMetrics,
    /// Output of the most recent successful cycle; `None` after a failure.
    pub latest: RwLock<Option<Metrics>>,
    /// Held by `/metrics` across refresh and gather so concurrent requests
    /// never observe each other's reset.
    pub render_lock: Mutex<()>,
    pub scrape_stats: Arc<ScrapeStats>,
    pub config: Arc<Config>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
