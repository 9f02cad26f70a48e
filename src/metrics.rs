//! Prometheus metrics definitions for supervisord-exporter.
//!
//! The scraper produces [`Metrics`] batches; this module maps the latest batch
//! and the scrape health counters onto a Prometheus registry for the
//! `/metrics` endpoint.

use prometheus::{Gauge, IntCounter, IntGauge, IntGaugeVec, Opts, Registry};
use std::sync::atomic::Ordering;

use supervisord_exporter::builder::{PROCESS_COUNT, PROCESS_UPTIME};
use supervisord_exporter::scraper::ENDPOINT_ATTRIBUTE;
use supervisord_exporter::{Metrics, ScrapeStats};

/// Collection of exported Prometheus metrics.
#[derive(Clone)]
pub struct ExporterMetrics {
    // ========== supervisord Metrics ==========
    pub process_count: IntGaugeVec,  // labels: endpoint
    pub process_uptime: IntGaugeVec, // labels: endpoint, name

    // ========== Exporter Telemetry ==========
    pub up: IntGauge,
    pub scrapes_total: IntCounter,
    pub scrape_errors_total: IntCounter,
    pub field_parse_errors_total: IntCounter,
    pub last_scrape_duration_seconds: Gauge,
}

impl ExporterMetrics {
    /// Creates and registers all Prometheus metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let process_count = IntGaugeVec::new(
            Opts::new("supervisord_process_count", PROCESS_COUNT.description),
            &["endpoint"],
        )?;
        let process_uptime = IntGaugeVec::new(
            Opts::new("supervisord_process_uptime_seconds", PROCESS_UPTIME.description),
            &["endpoint", "name"],
        )?;
        let up = IntGauge::new(
            "supervisord_up",
            "Whether the last scrape of supervisord succeeded (1) or failed (0)",
        )?;
        let scrapes_total = IntCounter::new(
            "supervisord_exporter_scrapes_total",
            "Total number of scrape cycles run",
        )?;
        let scrape_errors_total = IntCounter::new(
            "supervisord_exporter_scrape_errors_total",
            "Total number of scrape cycles that failed",
        )?;
        let field_parse_errors_total = IntCounter::new(
            "supervisord_exporter_field_parse_errors_total",
            "Total number of process fields that could not be parsed as integers",
        )?;
        let last_scrape_duration_seconds = Gauge::new(
            "supervisord_exporter_last_scrape_duration_seconds",
            "Duration of the most recent scrape cycle",
        )?;

        registry.register(Box::new(process_count.clone()))?;
        registry.register(Box::new(process_uptime.clone()))?;
        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(scrapes_total.clone()))?;
        registry.register(Box::new(scrape_errors_total.clone()))?;
        registry.register(Box::new(field_parse_errors_total.clone()))?;
        registry.register(Box::new(last_scrape_duration_seconds.clone()))?;

        Ok(Self {
            process_count,
            process_uptime,
            up,
            scrapes_total,
            scrape_errors_total,
            field_parse_errors_total,
            last_scrape_duration_seconds,
        })
    }

    /// Replaces the supervisord series with the contents of `latest`.
    ///
    /// `None` means the last cycle failed; all process series are dropped so
    /// stale values are never served.
    pub fn refresh(&self, latest: Option<&Metrics>, stats: &ScrapeStats) {
        self.process_count.reset();
        self.process_uptime.reset();

        if let Some(metrics) = latest {
            for rm in metrics.resource_metrics() {
                let endpoint = rm
                    .resource
                    .get(ENDPOINT_ATTRIBUTE)
                    .map(String::as_str)
                    .unwrap_or("");
                for metric in &rm.metrics {
                    for point in &metric.points {
                        if metric.name == PROCESS_COUNT.name {
                            self.process_count
                                .with_label_values(&[endpoint])
                                .set(point.value);
                        } else if metric.name == PROCESS_UPTIME.name {
                            let name = point.attributes.get("name").map(String::as_str).unwrap_or("");
                            self.process_uptime
                                .with_label_values(&[endpoint, name])
                                .set(point.value);
                        }
                    }
                }
            }
        }

        self.up.set(i64::from(stats.is_healthy()));
        sync_counter(&self.scrapes_total, stats.scrapes_total.load(Ordering::Relaxed));
        sync_counter(
            &self.scrape_errors_total,
            stats.scrape_errors_total.load(Ordering::Relaxed),
        );
        sync_counter(
            &self.field_parse_errors_total,
            stats.field_parse_errors_total.load(Ordering::Relaxed),
        );
        let (last_ms, _, _, _, _) = stats.scrape_duration_ms.snapshot();
        self.last_scrape_duration_seconds.set(last_ms / 1000.0);
    }
}

/// Advances a Prometheus counter to an externally tracked total.
fn sync_counter(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};
    use supervisord_exporter::builder::{MetricsBuilder, MetricsSettings, ResourceOption};
    use supervisord_exporter::health_stats::CycleReport;
    use supervisord_exporter::{BuildInfo, Timestamp};

    fn encode(registry: &Registry) -> String {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buf)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_refresh_exposes_latest_batch() {
        let registry = Registry::new();
        let metrics = ExporterMetrics::new(&registry).unwrap();
        let stats = ScrapeStats::new();
        stats.record_cycle(CycleReport {
            success: true,
            duration: std::time::Duration::from_millis(3),
            records: 1,
            field_parse_errors: 0,
        });

        let mut mb = MetricsBuilder::new(&MetricsSettings::default(), BuildInfo::default(), &[]);
        let now = Timestamp::now();
        mb.record_process_count(now, 1);
        mb.record_process_uptime(now, 60, "web");
        let batch = mb.emit(&[ResourceOption::Attribute(
            ENDPOINT_ATTRIBUTE.into(),
            "unix:///tmp/sv.sock".into(),
        )]);

        metrics.refresh(Some(&batch), &stats);
        let text = encode(&registry);
        assert!(text.contains(r#"supervisord_process_count{endpoint="unix:///tmp/sv.sock"} 1"#));
        assert!(text.contains(
            r#"supervisord_process_uptime_seconds{endpoint="unix:///tmp/sv.sock",name="web"} 60"#
        ));
        assert!(text.contains("supervisord_up 1"));
        assert!(text.contains("supervisord_exporter_scrapes_total 1"));

        // A failed cycle drops the process series.
        metrics.refresh(None, &stats);
        let text = encode(&registry);
        assert!(!text.contains("supervisord_process_uptime_seconds{"));
    }
}
