//! Scrape health statistics.
//!
//! Tracks how the scrape cycles are doing: totals, failures, field parse
//! problems and timing. Updated by the scraper, read by the HTTP handlers.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns (last, avg, max, min, count).
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Outcome of one scrape cycle as seen by the scraper.
#[derive(Debug, Clone, Copy)]
pub struct CycleReport {
    pub success: bool,
    pub duration: Duration,
    pub records: usize,
    pub field_parse_errors: u64,
}

/// Aggregated scrape health.
pub struct ScrapeStats {
    pub scrapes_total: AtomicU64,
    pub scrape_errors_total: AtomicU64,
    pub field_parse_errors_total: AtomicU64,
    pub last_record_count: AtomicU64,
    /// Unix seconds of the last successful cycle, 0 if none yet.
    pub last_success_unix: AtomicU64,
    pub last_scrape_ok: AtomicBool,
    pub scrape_duration_ms: Stat,
    started: Instant,
}

impl Default for ScrapeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrapeStats {
    pub fn new() -> Self {
        Self {
            scrapes_total: AtomicU64::new(0),
            scrape_errors_total: AtomicU64::new(0),
            field_parse_errors_total: AtomicU64::new(0),
            last_record_count: AtomicU64::new(0),
            last_success_unix: AtomicU64::new(0),
            last_scrape_ok: AtomicBool::new(false),
            scrape_duration_ms: Stat::default(),
            started: Instant::now(),
        }
    }

    pub fn record_cycle(&self, report: CycleReport) {
        self.scrapes_total.fetch_add(1, Ordering::Relaxed);
        self.scrape_duration_ms
            .add_sample(report.duration.as_secs_f64() * 1000.0);
        self.field_parse_errors_total
            .fetch_add(report.field_parse_errors, Ordering::Relaxed);
        self.last_scrape_ok.store(report.success, Ordering::Relaxed);

        if report.success {
            self.last_record_count
                .store(report.records as u64, Ordering::Relaxed);
            let now = SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            self.last_success_unix.store(now, Ordering::Relaxed);
        } else {
            self.scrape_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.last_scrape_ok.load(Ordering::Relaxed)
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Renders a plain-text table for the /health endpoint.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let (last, avg, max, min, count) = self.scrape_duration_ms.snapshot();

        writeln!(out, "SCRAPE STATISTICS").ok();
        writeln!(out, "=================").ok();
        writeln!(out).ok();
        writeln!(out, "{:32} | {:>12}", "Metric", "Value").ok();
        writeln!(out, "{}", "-".repeat(47)).ok();
        let rows: [(&str, u64); 5] = [
            ("scrapes_total", self.scrapes_total.load(Ordering::Relaxed)),
            ("scrape_errors_total", self.scrape_errors_total.load(Ordering::Relaxed)),
            (
                "field_parse_errors_total",
                self.field_parse_errors_total.load(Ordering::Relaxed),
            ),
            ("last_record_count", self.last_record_count.load(Ordering::Relaxed)),
            ("last_success_unix", self.last_success_unix.load(Ordering::Relaxed)),
        ];
        for (name, value) in rows {
            writeln!(out, "{:32} | {:>12}", name, value).ok();
        }
        writeln!(out).ok();
        writeln!(
            out,
            "{:32} | {:>8} | {:>8} | {:>8} | {:>8} | {:>6}",
            "Timing (ms)", "last", "avg", "max", "min", "count"
        )
        .ok();
        writeln!(out, "{}", "-".repeat(85)).ok();
        writeln!(
            out,
            "{:32} | {:>8.2} | {:>8.2} | {:>8.2} | {:>8.2} | {:>6}",
            "scrape_duration", last, avg, max, min, count
        )
        .ok();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stat() {
        let mut s = RunningStat::default();
        s.add(2.0);
        s.add(4.0);
        s.add(0.0);
        assert_eq!(s.min, 0.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.last, 0.0);
        assert_eq!(s.avg(), 2.0);
    }

    #[test]
    fn test_record_cycle_success_and_failure() {
        let stats = ScrapeStats::new();
        assert!(!stats.is_healthy());

        stats.record_cycle(CycleReport {
            success: true,
            duration: Duration::from_millis(5),
            records: 3,
            field_parse_errors: 1,
        });
        assert!(stats.is_healthy());
        assert_eq!(stats.last_record_count.load(Ordering::Relaxed), 3);
        assert!(stats.last_success_unix.load(Ordering::Relaxed) > 0);

        stats.record_cycle(CycleReport {
            success: false,
            duration: Duration::from_millis(1),
            records: 0,
            field_parse_errors: 0,
        });
        assert!(!stats.is_healthy());
        assert_eq!(stats.scrapes_total.load(Ordering::Relaxed), 2);
        assert_eq!(stats.scrape_errors_total.load(Ordering::Relaxed), 1);
        assert_eq!(stats.field_parse_errors_total.load(Ordering::Relaxed), 1);
        // Failed cycle keeps the last good record count.
        assert_eq!(stats.last_record_count.load(Ordering::Relaxed), 3);

        let (_, _, _, _, count) = stats.scrape_duration_ms.snapshot();
        assert_eq!(count, 2);
        assert!(stats.render_table().contains("scrape_errors_total"));
    }
}
