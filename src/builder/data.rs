//! Immutable metric data produced by the builder.
//!
//! A [`Metrics`] value is what one `emit` hands back to the host: an ordered
//! list of [`ResourceMetrics`], each holding the metrics recorded under one
//! resource identity together with the instrumentation scope.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Attribute set attached to a data point or a resource.
pub type Attributes = BTreeMap<String, String>;

/// Nanoseconds since the unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub fn now() -> Self {
        Utc::now().into()
    }

    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0 / 1_000_000_000
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        // Dates before the epoch or past 2262 do not fit; clamp to the edges.
        match dt.timestamp_nanos_opt() {
            Some(n) if n >= 0 => Self(n as u64),
            Some(_) => Self(0),
            None => Self(u64::MAX),
        }
    }
}

/// Single gauge observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricPoint {
    pub start_timestamp: Timestamp,
    pub timestamp: Timestamp,
    pub value: i64,
    pub attributes: Attributes,
}

/// Data type of an emitted metric. Only gauges are produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
}

/// Emitted snapshot of one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
    pub kind: MetricKind,
    pub points: Vec<MetricPoint>,
}

/// Name and version of the component that produced the metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub name: String,
    pub version: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Metrics recorded under one resource identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceMetrics {
    pub resource: Attributes,
    pub scope: BuildInfo,
    pub metrics: Vec<Metric>,
}

impl ResourceMetrics {
    /// Finds an emitted metric by name.
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

/// Output of one `emit`: every batch accumulated since the previous one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    resource_metrics: Vec<ResourceMetrics>,
}

impl Metrics {
    pub(crate) fn new(resource_metrics: Vec<ResourceMetrics>) -> Self {
        Self { resource_metrics }
    }

    pub fn resource_metrics(&self) -> &[ResourceMetrics] {
        &self.resource_metrics
    }

    pub fn is_empty(&self) -> bool {
        self.resource_metrics.is_empty()
    }

    pub fn metric_count(&self) -> usize {
        self.resource_metrics.iter().map(|rm| rm.metrics.len()).sum()
    }

    pub fn data_point_count(&self) -> usize {
        self.resource_metrics
            .iter()
            .flat_map(|rm| rm.metrics.iter())
            .map(|m| m.points.len())
            .sum()
    }

    /// Iterates every emitted metric across all batches, in emission order.
    pub fn iter_metrics(&self) -> impl Iterator<Item = &Metric> {
        self.resource_metrics.iter().flat_map(|rm| rm.metrics.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_from_datetime() {
        let dt = Utc.timestamp_opt(1_700_000_000, 5).unwrap();
        let ts = Timestamp::from(dt);
        assert_eq!(ts.as_nanos(), 1_700_000_000_000_000_005);
        assert_eq!(ts.as_secs(), 1_700_000_000);
    }

    #[test]
    fn test_timestamp_before_epoch_clamps() {
        let dt = Utc.timestamp_opt(-10, 0).unwrap();
        assert_eq!(Timestamp::from(dt), Timestamp::from_nanos(0));
    }
}
