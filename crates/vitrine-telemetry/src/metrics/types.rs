// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::Serialize;
use std::fmt::{self, Display};
use std::time::Instant;

/// A unique, structured identifier for a metric.
///
/// A `MetricId` is composed of a namespace, a name, and a set of key-value
/// labels, so several instances of the same component can report side by side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MetricId {
    /// The broad category of the metric (e.g., "asset_cache").
    pub namespace: String,
    /// The specific name of the metric (e.g., "decode_total").
    pub name: String,
    /// Optional, sorted key-value pairs for dimensional filtering.
    pub labels: Vec<(String, String)>,
}

impl MetricId {
    /// Creates a new `MetricId` with a namespace and a name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            labels: Vec::new(),
        }
    }

    /// Adds a dimensional label, keeping labels sorted by key.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self.labels.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)?;
        if !self.labels.is_empty() {
            let labels = self
                .labels
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "[{labels}]")?;
        }
        Ok(())
    }
}

/// The fundamental type of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricType {
    /// A value that only ever increases.
    Counter,
    /// A value that can go up or down.
    Gauge,
    /// The distribution of a set of measurements.
    Histogram,
}

/// The current value of a metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MetricValue {
    /// A monotonically increasing count.
    Counter(u64),
    /// A point-in-time reading.
    Gauge(f64),
    /// Samples bucketed by upper bound.
    Histogram {
        /// Number of recorded samples.
        count: u64,
        /// Sum of all recorded samples.
        sum: f64,
        /// The upper bounds of the buckets, ascending.
        bucket_bounds: Vec<f64>,
        /// Cumulative count of samples `<=` each bound.
        bucket_counts: Vec<u64>,
    },
}

impl MetricValue {
    /// Returns the [`MetricType`] corresponding to this value.
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
            MetricValue::Histogram { .. } => MetricType::Histogram,
        }
    }

    /// Returns the value as a `u64` if it is a `Counter`.
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            MetricValue::Counter(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is a `Gauge`.
    pub fn as_gauge(&self) -> Option<f64> {
        match self {
            MetricValue::Gauge(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the sample count if it is a `Histogram`.
    pub fn histogram_count(&self) -> Option<u64> {
        match self {
            MetricValue::Histogram { count, .. } => Some(*count),
            _ => None,
        }
    }
}

/// A registered metric: its identity, description and current value.
#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    /// The metric's unique identifier.
    pub id: MetricId,
    /// A human-readable description of what the metric measures.
    pub description: String,
    /// The unit of measurement (e.g., "ms", "count").
    pub unit: String,
    /// The current value.
    pub value: MetricValue,
    /// When the value last changed.
    #[serde(skip)]
    pub last_updated: Option<Instant>,
}

impl Metric {
    /// A new counter starting at zero.
    pub fn new_counter(id: MetricId, description: impl Into<String>) -> Self {
        Self::new(id, description, "count", MetricValue::Counter(0))
    }

    /// A new gauge starting at zero.
    pub fn new_gauge(id: MetricId, description: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::new(id, description, unit, MetricValue::Gauge(0.0))
    }

    /// A new, empty histogram. Bounds are sorted ascending.
    pub fn new_histogram(
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        mut bucket_bounds: Vec<f64>,
    ) -> Self {
        bucket_bounds.sort_by(f64::total_cmp);
        let bucket_counts = vec![0; bucket_bounds.len()];
        Self::new(
            id,
            description,
            unit,
            MetricValue::Histogram {
                count: 0,
                sum: 0.0,
                bucket_bounds,
                bucket_counts,
            },
        )
    }

    fn new(
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        value: MetricValue,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            unit: unit.into(),
            value,
            last_updated: None,
        }
    }

    /// The type of this metric.
    pub fn metric_type(&self) -> MetricType {
        self.value.metric_type()
    }

    pub(crate) fn touch(&mut self) {
        self.last_updated = Some(Instant::now());
    }
}

/// A specialized `Result` type for metric-related operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error that can occur within the metrics system.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// The requested metric was not found.
    MetricNotFound(MetricId),
    /// An operation was attempted on a metric of the wrong type.
    TypeMismatch {
        /// The type the operation needs.
        expected: MetricType,
        /// The type that was found.
        found: MetricType,
    },
    /// An error originating from the storage layer.
    StorageError(String),
}

impl Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::MetricNotFound(id) => write!(f, "Metric not found: {id}"),
            MetricsError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {expected:?}, found {found:?}")
            }
            MetricsError::StorageError(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for MetricsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_id_labels_are_sorted() {
        let id = MetricId::new("asset_cache", "decode_total")
            .with_label("source", "fs")
            .with_label("format", "glb");
        assert_eq!(id.labels[0].0, "format");
        assert_eq!(
            id.to_string(),
            "asset_cache:decode_total[format=glb,source=fs]"
        );
        assert_eq!(MetricId::new("a", "b").to_string(), "a:b");
    }

    #[test]
    fn test_histogram_bounds_are_sorted() {
        let metric = Metric::new_histogram(MetricId::new("t", "h"), "", "ms", vec![10.0, 1.0]);
        match metric.value {
            MetricValue::Histogram { bucket_bounds, .. } => assert_eq!(bucket_bounds, vec![1.0, 10.0]),
            other => panic!("unexpected value {other:?}"),
        }
    }
}
