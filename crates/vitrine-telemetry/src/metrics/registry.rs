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

//! Registry for managing metrics.

use super::{Metric, MetricId, MetricType, MetricsError, MetricsResult};
use crate::storage::{InMemoryBackend, MetricsBackend};
use std::sync::Arc;

/// Central entry point of the metrics system.
///
/// The registry creates metrics on its backend and returns typed handles for
/// updating them. Registering an id that already exists resets it.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    backend: Arc<dyn MetricsBackend>,
}

impl MetricsRegistry {
    /// Creates a registry with the default in-memory backend.
    pub fn new() -> Self {
        Self {
            backend: Arc::new(InMemoryBackend::new()),
        }
    }

    /// Creates a registry writing to a custom backend.
    pub fn with_backend(backend: Arc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }

    /// Registers a counter.
    pub fn register_counter(
        &self,
        id: MetricId,
        description: impl Into<String>,
    ) -> MetricsResult<CounterHandle> {
        self.backend
            .put_metric(Metric::new_counter(id.clone(), description))?;
        Ok(CounterHandle::new(id, self.backend.clone()))
    }

    /// Registers a gauge.
    pub fn register_gauge(
        &self,
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> MetricsResult<GaugeHandle> {
        self.backend
            .put_metric(Metric::new_gauge(id.clone(), description, unit))?;
        Ok(GaugeHandle::new(id, self.backend.clone()))
    }

    /// Registers a histogram with the given bucket upper bounds.
    pub fn register_histogram(
        &self,
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        buckets: Vec<f64>,
    ) -> MetricsResult<HistogramHandle> {
        self.backend
            .put_metric(Metric::new_histogram(id.clone(), description, unit, buckets))?;
        Ok(HistogramHandle::new(id, self.backend.clone()))
    }

    /// Gets a copy of a metric.
    pub fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        self.backend.get_metric(id)
    }

    /// All metrics in a namespace, sorted by name.
    pub fn get_namespace_metrics(&self, namespace: &str) -> Vec<Metric> {
        let mut metrics: Vec<Metric> = self
            .backend
            .list_all_metrics()
            .into_iter()
            .filter(|m| m.id.namespace == namespace)
            .collect();
        metrics.sort_by(|a, b| a.id.name.cmp(&b.id.name).then(a.id.labels.cmp(&b.id.labels)));
        metrics
    }

    /// Serializes every metric of `namespace` as pretty JSON.
    pub fn namespace_to_json(&self, namespace: &str) -> MetricsResult<String> {
        serde_json::to_string_pretty(&self.get_namespace_metrics(namespace))
            .map_err(|e| MetricsError::StorageError(e.to_string()))
    }

    /// The total number of metrics.
    pub fn metric_count(&self) -> usize {
        self.backend.metric_count()
    }

    /// Direct access to the backend.
    pub fn backend(&self) -> &Arc<dyn MetricsBackend> {
        &self.backend
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for counter operations.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    id: MetricId,
    backend: Arc<dyn MetricsBackend>,
}

impl CounterHandle {
    fn new(id: MetricId, backend: Arc<dyn MetricsBackend>) -> Self {
        Self { id, backend }
    }

    /// Increments the counter by 1.
    pub fn increment(&self) -> MetricsResult<u64> {
        self.backend.increment_counter(&self.id, 1)
    }

    /// Increments the counter by a specific amount.
    pub fn increment_by(&self, amount: u64) -> MetricsResult<u64> {
        self.backend.increment_counter(&self.id, amount)
    }

    /// Gets the current counter value.
    pub fn get(&self) -> MetricsResult<u64> {
        let metric = self.backend.get_metric(&self.id)?;
        metric
            .value
            .as_counter()
            .ok_or(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: metric.metric_type(),
            })
    }

    /// Gets the metric ID.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle for gauge operations.
#[derive(Debug, Clone)]
pub struct GaugeHandle {
    id: MetricId,
    backend: Arc<dyn MetricsBackend>,
}

impl GaugeHandle {
    fn new(id: MetricId, backend: Arc<dyn MetricsBackend>) -> Self {
        Self { id, backend }
    }

    /// Sets the gauge to a specific value.
    pub fn set(&self, value: f64) -> MetricsResult<()> {
        self.backend.set_gauge(&self.id, value)
    }

    /// Adds `delta` and returns the new value.
    pub fn add(&self, delta: f64) -> MetricsResult<f64> {
        self.backend.add_to_gauge(&self.id, delta)
    }

    /// Subtracts `delta` and returns the new value.
    pub fn sub(&self, delta: f64) -> MetricsResult<f64> {
        self.add(-delta)
    }

    /// Gets the current gauge value.
    pub fn get(&self) -> MetricsResult<f64> {
        let metric = self.backend.get_metric(&self.id)?;
        metric.value.as_gauge().ok_or(MetricsError::TypeMismatch {
            expected: MetricType::Gauge,
            found: metric.metric_type(),
        })
    }

    /// Gets the metric ID.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle for histogram operations.
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    id: MetricId,
    backend: Arc<dyn MetricsBackend>,
}

impl HistogramHandle {
    fn new(id: MetricId, backend: Arc<dyn MetricsBackend>) -> Self {
        Self { id, backend }
    }

    /// Records a sample.
    pub fn observe(&self, value: f64) -> MetricsResult<()> {
        self.backend.record_histogram_sample(&self.id, value)
    }

    /// Number of samples recorded so far.
    pub fn count(&self) -> MetricsResult<u64> {
        let metric = self.backend.get_metric(&self.id)?;
        metric.value.histogram_count().ok_or(MetricsError::TypeMismatch {
            expected: MetricType::Histogram,
            found: metric.metric_type(),
        })
    }

    /// Gets the metric ID.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}
