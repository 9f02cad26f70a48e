//! Metrics builder for supervisord process metrics.
//!
//! The builder accumulates data points between emissions, enforces per-metric
//! enablement, and packages everything recorded since the last emission into
//! resource-scoped batches. It is owned by exactly one scraper and never
//! shared, so no locking is involved.
//!
//! Lifecycle of one window:
//!
//! 1. `record_*` calls append points to enabled series.
//! 2. [`MetricsBuilder::emit_for_resource`] moves them into a
//!    [`ResourceMetrics`] batch on the internal buffer.
//! 3. [`MetricsBuilder::emit`] drains the buffer and hands it to the caller.

pub mod data;
pub mod series;

use serde::{Deserialize, Serialize};

pub use data::{
    Attributes, BuildInfo, Metric, MetricKind, MetricPoint, Metrics, ResourceMetrics, Timestamp,
};
pub use series::{MetricDescriptor, NameAttribute, NoAttributes, PointAttributes};

use series::Series;

pub static PROCESS_COUNT: MetricDescriptor = MetricDescriptor {
    name: "supervisord.process.count",
    description: "The number of processes managed by supervisord",
    unit: "{processes}",
    kind: MetricKind::Gauge,
};

pub static PROCESS_UPTIME: MetricDescriptor = MetricDescriptor {
    name: "supervisord.process.uptime",
    description: "Seconds between the last start and stop of a supervised process",
    unit: "s",
    kind: MetricKind::Gauge,
};

/// Identifies one of the builder's series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricName {
    ProcessCount,
    ProcessUptime,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ProcessCount => PROCESS_COUNT.name,
            MetricName::ProcessUptime => PROCESS_UPTIME.name,
        }
    }
}

/// Settings for a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for MetricSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

/// Per-metric settings for every metric the builder can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSettings {
    #[serde(rename = "supervisord.process.count", default)]
    pub process_count: MetricSettings,
    #[serde(rename = "supervisord.process.uptime", default)]
    pub process_uptime: MetricSettings,
}

impl MetricsSettings {
    pub fn any_enabled(&self) -> bool {
        self.process_count.enabled || self.process_uptime.enabled
    }
}

/// Option applied when the builder is created or reset.
#[derive(Debug, Clone)]
pub enum BuilderOption {
    /// Use this start time instead of "now".
    StartTime(Timestamp),
}

impl BuilderOption {
    fn apply(&self, mb: &mut MetricsBuilder) {
        match self {
            BuilderOption::StartTime(ts) => mb.start_time = *ts,
        }
    }
}

/// Option applied to a single batch in [`MetricsBuilder::emit_for_resource`].
#[derive(Debug, Clone)]
pub enum ResourceOption {
    /// Replace the start timestamp of every point in the batch. Used when the
    /// points describe a resource whose lifetime differs from the builder's.
    StartTimeOverride(Timestamp),
    /// Attach an attribute to the batch's resource.
    Attribute(String, String),
}

impl ResourceOption {
    fn apply(&self, rm: &mut ResourceMetrics) {
        match self {
            ResourceOption::StartTimeOverride(start) => {
                for metric in &mut rm.metrics {
                    for point in &mut metric.points {
                        point.start_timestamp = *start;
                    }
                }
            }
            ResourceOption::Attribute(key, value) => {
                rm.resource.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Accumulates process metrics and produces [`Metrics`] batches.
pub struct MetricsBuilder {
    start_time: Timestamp,
    metrics_buffer: Vec<ResourceMetrics>,
    /// Highest number of batches held in the buffer at once.
    metrics_capacity: usize,
    /// Highest number of metrics placed in one batch.
    resource_capacity: usize,
    build_info: BuildInfo,
    process_count: Series<NoAttributes>,
    process_uptime: Series<NameAttribute>,
}

impl MetricsBuilder {
    pub fn new(settings: &MetricsSettings, build_info: BuildInfo, options: &[BuilderOption]) -> Self {
        let mut mb = Self {
            start_time: Timestamp::now(),
            metrics_buffer: Vec::new(),
            metrics_capacity: 0,
            resource_capacity: 0,
            build_info,
            process_count: Series::new(&PROCESS_COUNT, settings.process_count),
            process_uptime: Series::new(&PROCESS_UPTIME, settings.process_uptime),
        };
        for op in options {
            op.apply(&mut mb);
        }
        mb
    }

    /// Records the number of supervised processes.
    pub fn record_process_count(&mut self, ts: Timestamp, count: i64) {
        self.process_count
            .record(self.start_time, ts, count, NoAttributes);
    }

    /// Records the uptime of one supervised process.
    pub fn record_process_uptime(&mut self, ts: Timestamp, uptime_seconds: i64, name: &str) {
        self.process_uptime.record(
            self.start_time,
            ts,
            uptime_seconds,
            NameAttribute(name.to_string()),
        );
    }

    /// Moves everything recorded so far into a new batch on the internal buffer.
    ///
    /// A batch without metrics is dropped, so an idle window leaves the buffer
    /// untouched. Every series starts a new window afterwards.
    pub fn emit_for_resource(&mut self, options: &[ResourceOption]) {
        let mut metrics = Vec::with_capacity(self.resource_capacity);
        self.process_count.emit(&mut metrics);
        self.process_uptime.emit(&mut metrics);

        let mut rm = ResourceMetrics {
            resource: Attributes::new(),
            scope: self.build_info.clone(),
            metrics,
        };
        for op in options {
            op.apply(&mut rm);
        }

        if rm.metrics.is_empty() {
            return;
        }
        self.resource_capacity = self.resource_capacity.max(rm.metrics.len());
        self.metrics_buffer.push(rm);
        self.metrics_capacity = self.metrics_capacity.max(self.metrics_buffer.len());
    }

    /// Emits the current window and drains the buffer.
    pub fn emit(&mut self, options: &[ResourceOption]) -> Metrics {
        self.emit_for_resource(options);
        let buffer = std::mem::replace(
            &mut self.metrics_buffer,
            Vec::with_capacity(self.metrics_capacity),
        );
        Metrics::new(buffer)
    }

    /// Moves the start-time baseline to now, then applies `options`.
    ///
    /// Call this only when the upstream source is known to have restarted.
    /// Points already emitted keep their original start time.
    pub fn reset(&mut self, options: &[BuilderOption]) {
        self.start_time = Timestamp::now();
        for op in options {
            op.apply(self);
        }
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn metrics_capacity(&self) -> usize {
        self.metrics_capacity
    }

    pub fn resource_capacity(&self) -> usize {
        self.resource_capacity
    }

    pub fn series_capacity(&self, name: MetricName) -> usize {
        match name {
            MetricName::ProcessCount => self.process_count.capacity(),
            MetricName::ProcessUptime => self.process_uptime.capacity(),
        }
    }

    pub fn build_info(&self) -> &BuildInfo {
        &self.build_info
    }
}
