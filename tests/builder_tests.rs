//! Integration tests for the metrics builder.
//!
//! These tests drive the builder through several windows the way the scraper
//! does and check the emitted batches and the capacity hints.

use supervisord_exporter::builder::{
    BuilderOption, MetricName, MetricSettings, MetricsBuilder, MetricsSettings, ResourceOption,
    PROCESS_COUNT, PROCESS_UPTIME,
};
use supervisord_exporter::{BuildInfo, Timestamp};

fn settings(count: bool, uptime: bool) -> MetricsSettings {
    MetricsSettings {
        process_count: MetricSettings { enabled: count },
        process_uptime: MetricSettings { enabled: uptime },
    }
}

fn record_window(mb: &mut MetricsBuilder, now: Timestamp, processes: usize) {
    mb.record_process_count(now, processes as i64);
    for i in 0..processes {
        mb.record_process_uptime(now, i as i64, &format!("proc-{i}"));
    }
}

#[test]
fn test_capacity_is_high_water_mark() {
    let mut mb = MetricsBuilder::new(&settings(true, true), BuildInfo::default(), &[]);

    let mut seen = Vec::new();
    for (window, processes) in [2usize, 5, 3, 0, 4].into_iter().enumerate() {
        record_window(&mut mb, Timestamp::from_nanos(window as u64 + 1), processes);
        let metrics = mb.emit(&[]);
        assert_eq!(metrics.data_point_count(), processes + 1);
        seen.push(mb.series_capacity(MetricName::ProcessUptime));
    }

    assert_eq!(seen, vec![2, 5, 5, 5, 5]);
    assert_eq!(mb.series_capacity(MetricName::ProcessCount), 1);
    assert_eq!(mb.metrics_capacity(), 1);
}

#[test]
fn test_windows_do_not_leak_points() {
    let mut mb = MetricsBuilder::new(&settings(true, true), BuildInfo::default(), &[]);

    record_window(&mut mb, Timestamp::from_nanos(1), 3);
    let first = mb.emit(&[]);
    record_window(&mut mb, Timestamp::from_nanos(2), 1);
    let second = mb.emit(&[]);

    assert_eq!(first.data_point_count(), 4);
    assert_eq!(second.data_point_count(), 2);
    let uptime = second.resource_metrics()[0]
        .metric(PROCESS_UPTIME.name)
        .unwrap();
    assert_eq!(uptime.points.len(), 1);
    assert_eq!(uptime.points[0].timestamp, Timestamp::from_nanos(2));
}

#[test]
fn test_all_disabled_emits_nothing() {
    let mut mb = MetricsBuilder::new(&settings(false, false), BuildInfo::default(), &[]);
    record_window(&mut mb, Timestamp::from_nanos(1), 3);

    let metrics = mb.emit(&[ResourceOption::Attribute("k".into(), "v".into())]);
    assert!(metrics.is_empty());
    assert_eq!(mb.series_capacity(MetricName::ProcessCount), 0);
    assert_eq!(mb.series_capacity(MetricName::ProcessUptime), 0);
}

#[test]
fn test_metric_metadata() {
    let mut mb = MetricsBuilder::new(&settings(true, true), BuildInfo::default(), &[]);
    record_window(&mut mb, Timestamp::from_nanos(1), 1);
    let metrics = mb.emit(&[]);
    let rm = &metrics.resource_metrics()[0];

    let count = rm.metric(PROCESS_COUNT.name).unwrap();
    assert_eq!(count.unit, "{processes}");
    assert!(count.points[0].attributes.is_empty());

    let uptime = rm.metric(PROCESS_UPTIME.name).unwrap();
    assert_eq!(uptime.unit, "s");
    assert_eq!(uptime.points[0].attributes["name"], "proc-0");
}

#[test]
fn test_reset_keeps_capacities() {
    let start = Timestamp::from_nanos(10);
    let mut mb = MetricsBuilder::new(
        &settings(true, true),
        BuildInfo::default(),
        &[BuilderOption::StartTime(start)],
    );
    record_window(&mut mb, Timestamp::from_nanos(20), 4);
    mb.emit(&[]);

    mb.reset(&[BuilderOption::StartTime(Timestamp::from_nanos(30))]);
    assert_eq!(mb.start_time(), Timestamp::from_nanos(30));
    assert_eq!(mb.series_capacity(MetricName::ProcessUptime), 4);
    assert_eq!(mb.resource_capacity(), 2);
}
