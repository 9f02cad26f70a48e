//! Scrape orchestration: fetch, transform, emit.
//!
//! A [`SupervisordScraper`] is created uninitialized. [`SupervisordScraper::start`]
//! builds the status client; after that every call to
//! [`SupervisordScraper::scrape`] runs one full cycle. A failed cycle reports
//! its error and leaves the scraper ready for the next one.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::builder::{BuildInfo, Metrics, MetricsBuilder, ResourceOption, Timestamp};
use crate::client::StatusClient;
use crate::config::Config;
use crate::error::ScrapeError;
use crate::health_stats::{CycleReport, ScrapeStats};
use crate::stats::ProcessRecord;

/// Resource attribute naming the supervisord endpoint a batch came from.
pub const ENDPOINT_ATTRIBUTE: &str = "supervisord.endpoint";

pub struct SupervisordScraper {
    config: Config,
    client: Option<StatusClient>,
    mb: MetricsBuilder,
    stats: Option<Arc<ScrapeStats>>,
}

impl SupervisordScraper {
    pub fn new(config: Config, build_info: BuildInfo) -> Self {
        let mb = MetricsBuilder::new(&config.metrics, build_info, &[]);
        Self {
            config,
            client: None,
            mb,
            stats: None,
        }
    }

    /// Reports every cycle outcome to `stats`.
    pub fn with_stats(mut self, stats: Arc<ScrapeStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn is_started(&self) -> bool {
        self.client.is_some()
    }

    pub fn builder(&self) -> &MetricsBuilder {
        &self.mb
    }

    /// Creates the status client. On failure the scraper stays uninitialized.
    pub fn start(&mut self) -> Result<(), ScrapeError> {
        let client = StatusClient::new(&self.config)?;
        info!("Scraper started for {}", client.host());
        self.client = Some(client);
        Ok(())
    }

    /// Runs one scrape cycle.
    ///
    /// Returns [`ScrapeError::NotInitialized`] if [`start`](Self::start) has
    /// not succeeded. A fetch failure discards the whole cycle; the builder
    /// is not touched.
    #[instrument(skip(self))]
    pub async fn scrape(&mut self) -> Result<Metrics, ScrapeError> {
        let started = Instant::now();
        let Some(client) = self.client.as_mut() else {
            warn!("Scrape requested before the client was initialized");
            return Err(ScrapeError::NotInitialized);
        };

        let fetched = client.get_stats().await;
        match fetched {
            Ok(records) => {
                let now = Timestamp::now();
                let (metrics, field_parse_errors) = self.collect_statistics(now, &records);
                debug!(
                    "Scrape emitted {} data points for {} processes",
                    metrics.data_point_count(),
                    records.len()
                );
                self.report(CycleReport {
                    success: true,
                    duration: started.elapsed(),
                    records: records.len(),
                    field_parse_errors,
                });
                Ok(metrics)
            }
            Err(e) => {
                self.report(CycleReport {
                    success: false,
                    duration: started.elapsed(),
                    records: 0,
                    field_parse_errors: 0,
                });
                Err(e.into())
            }
        }
    }

    fn report(&self, report: CycleReport) {
        if let Some(stats) = &self.stats {
            stats.record_cycle(report);
        }
    }

    /// Turns one batch of records into builder calls and emits.
    /// Returns the metrics and the number of fields that failed to parse.
    fn collect_statistics(&mut self, now: Timestamp, records: &[ProcessRecord]) -> (Metrics, u64) {
        self.mb.record_process_count(now, records.len() as i64);

        let mut parse_errors = 0;
        for record in records {
            let start = parse_epoch(record, "start", &record.start);
            let stop = parse_epoch(record, "stop", &record.stop);
            parse_errors += u64::from(start.is_none()) + u64::from(stop.is_none());

            let uptime = match (start, stop) {
                (Some(start), Some(stop)) => stop.saturating_sub(start),
                _ => 0,
            };
            self.mb.record_process_uptime(now, uptime, &record.name);
        }

        let resource = ResourceOption::Attribute(
            ENDPOINT_ATTRIBUTE.to_string(),
            self.config.endpoint().to_string(),
        );
        (self.mb.emit(&[resource]), parse_errors)
    }
}

/// Parses an epoch field, logging and returning `None` when it is not an integer.
fn parse_epoch(record: &ProcessRecord, field: &'static str, raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(e) => {
            info!(
                expected_type = "integer",
                field,
                process = %record.name,
                value = %raw,
                error = %e,
                "invalid value"
            );
            None
        }
    }
}
