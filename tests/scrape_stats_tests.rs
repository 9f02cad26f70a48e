//! Integration tests for scrape health statistics.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use supervisord_exporter::health_stats::CycleReport;
use supervisord_exporter::ScrapeStats;

fn cycle(success: bool, ms: u64, records: usize, field_parse_errors: u64) -> CycleReport {
    CycleReport {
        success,
        duration: Duration::from_millis(ms),
        records,
        field_parse_errors,
    }
}

#[test]
fn test_scrape_stats_initialize() {
    let stats = ScrapeStats::new();
    assert_eq!(stats.scrapes_total.load(Ordering::Relaxed), 0);
    assert_eq!(stats.last_success_unix.load(Ordering::Relaxed), 0);
    assert!(!stats.is_healthy());

    let (_, _, _, _, count) = stats.scrape_duration_ms.snapshot();
    assert_eq!(count, 0);
}

#[test]
fn test_failure_keeps_last_record_count() {
    let stats = ScrapeStats::new();
    stats.record_cycle(cycle(true, 4, 3, 1));
    stats.record_cycle(cycle(false, 10, 0, 0));

    assert!(!stats.is_healthy());
    assert_eq!(stats.scrapes_total.load(Ordering::Relaxed), 2);
    assert_eq!(stats.scrape_errors_total.load(Ordering::Relaxed), 1);
    assert_eq!(stats.field_parse_errors_total.load(Ordering::Relaxed), 1);
    assert_eq!(stats.last_record_count.load(Ordering::Relaxed), 3);
    assert!(stats.last_success_unix.load(Ordering::Relaxed) > 0);

    let (last, avg, max, min, count) = stats.scrape_duration_ms.snapshot();
    assert_eq!(count, 2);
    assert!((last - 10.0).abs() < 1e-6);
    assert!((max - 10.0).abs() < 1e-6);
    assert!((min - 4.0).abs() < 1e-6);
    assert!((avg - 7.0).abs() < 1e-6);
}

#[test]
fn test_render_table_lists_counters() {
    let stats = ScrapeStats::new();
    stats.record_cycle(cycle(true, 2, 5, 0));
    let table = stats.render_table();
    assert!(table.contains("SCRAPE STATISTICS"));
    assert!(table.contains("scrapes_total"));
    assert!(table.contains("last_record_count"));
}

#[test]
fn test_concurrent_recording() {
    let stats = Arc::new(ScrapeStats::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let stats = stats.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    stats.record_cycle(cycle(i % 2 == 0, 1, 1, 0));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(stats.scrapes_total.load(Ordering::Relaxed), 100);
    assert_eq!(stats.scrape_errors_total.load(Ordering::Relaxed), 50);
}
