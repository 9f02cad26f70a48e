//! Generic per-metric accumulator.
//!
//! Every metric the builder knows about is a [`Series`] parameterized by the
//! shape of its point attributes. The series owns its settings, the points
//! recorded during the current window, and a capacity hint used to pre-size
//! the next window's buffer.

use std::marker::PhantomData;

use super::data::{Attributes, Metric, MetricKind, MetricPoint, Timestamp};
use super::MetricSettings;

/// Static description of a metric.
#[derive(Debug)]
pub struct MetricDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
    pub kind: MetricKind,
}

/// Converts a typed attribute value into the point's attribute set.
pub trait PointAttributes {
    fn into_attributes(self) -> Attributes;
}

/// Attribute shape of series whose points carry no attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttributes;

impl PointAttributes for NoAttributes {
    fn into_attributes(self) -> Attributes {
        Attributes::new()
    }
}

/// Attribute shape carrying the supervised process name.
#[derive(Debug, Clone)]
pub struct NameAttribute(pub String);

impl PointAttributes for NameAttribute {
    fn into_attributes(self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("name".to_string(), self.0);
        attrs
    }
}

pub(crate) struct Series<A> {
    descriptor: &'static MetricDescriptor,
    settings: MetricSettings,
    points: Vec<MetricPoint>,
    /// Highest number of points ever emitted in one window.
    capacity: usize,
    _attributes: PhantomData<fn(A)>,
}

impl<A: PointAttributes> Series<A> {
    pub(crate) fn new(descriptor: &'static MetricDescriptor, settings: MetricSettings) -> Self {
        Self {
            descriptor,
            settings,
            points: Vec::new(),
            capacity: 0,
            _attributes: PhantomData,
        }
    }

    /// Appends a point. No-op when the metric is disabled.
    pub(crate) fn record(&mut self, start: Timestamp, ts: Timestamp, value: i64, attributes: A) {
        if !self.settings.enabled {
            return;
        }
        self.points.push(MetricPoint {
            start_timestamp: start,
            timestamp: ts,
            value,
            attributes: attributes.into_attributes(),
        });
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    /// Moves recorded points into `out` and starts a fresh window.
    ///
    /// Nothing is appended when the series is disabled or empty. The capacity
    /// hint only pre-sizes the next buffer; it never limits how many points
    /// can be recorded.
    pub(crate) fn emit(&mut self, out: &mut Vec<Metric>) {
        if !self.settings.enabled || self.points.is_empty() {
            return;
        }
        self.capacity = self.capacity.max(self.points.len());
        let points = std::mem::replace(&mut self.points, Vec::with_capacity(self.capacity));
        out.push(Metric {
            name: self.descriptor.name,
            description: self.descriptor.description,
            unit: self.descriptor.unit,
            kind: self.descriptor.kind,
            points,
        });
    }
}
