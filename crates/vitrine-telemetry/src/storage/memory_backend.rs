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

use super::MetricsBackend;
use crate::metrics::{Metric, MetricId, MetricsError, MetricsResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory metrics backend using `RwLock<HashMap>`.
///
/// Reads share the lock; every update takes the write lock for the duration
/// of the closure.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    storage: RwLock<HashMap<MetricId, Metric>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every metric in `namespace`.
    pub fn get_metrics_by_namespace(&self, namespace: &str) -> Vec<Metric> {
        match self.storage.read() {
            Ok(storage) => storage
                .values()
                .filter(|metric| metric.id.namespace == namespace)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn poisoned(what: &str) -> MetricsError {
    MetricsError::StorageError(format!("Failed to acquire {what} lock"))
}

impl MetricsBackend for InMemoryBackend {
    fn put_metric(&self, metric: Metric) -> MetricsResult<()> {
        let mut storage = self.storage.write().map_err(|_| poisoned("write"))?;
        storage.insert(metric.id.clone(), metric);
        Ok(())
    }

    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        let storage = self.storage.read().map_err(|_| poisoned("read"))?;
        storage
            .get(id)
            .cloned()
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn update_metric(
        &self,
        id: &MetricId,
        update: &mut dyn FnMut(&mut Metric) -> MetricsResult<()>,
    ) -> MetricsResult<()> {
        let mut storage = self.storage.write().map_err(|_| poisoned("write"))?;
        let metric = storage
            .get_mut(id)
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))?;
        update(metric)?;
        metric.touch();
        Ok(())
    }

    fn contains_metric(&self, id: &MetricId) -> bool {
        self.storage
            .read()
            .map(|storage| storage.contains_key(id))
            .unwrap_or(false)
    }

    fn remove_metric(&self, id: &MetricId) -> MetricsResult<()> {
        let mut storage = self.storage.write().map_err(|_| poisoned("write"))?;
        storage
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn list_all_metrics(&self) -> Vec<Metric> {
        self.storage
            .read()
            .map(|storage| storage.values().cloned().collect())
            .unwrap_or_default()
    }

    fn metric_count(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricType, MetricValue};
    use std::sync::Arc;

    #[test]
    fn test_basic_operations() {
        let backend = InMemoryBackend::new();
        let id = MetricId::new("test", "counter");
        backend.put_metric(Metric::new_counter(id.clone(), "Test counter")).unwrap();
        assert!(backend.contains_metric(&id));
        assert_eq!(backend.increment_counter(&id, 2).unwrap(), 2);
        assert_eq!(backend.metric_count(), 1);

        backend.remove_metric(&id).unwrap();
        assert!(!backend.contains_metric(&id));
        assert_eq!(
            backend.remove_metric(&id),
            Err(MetricsError::MetricNotFound(id))
        );
    }

    #[test]
    fn test_type_mismatch() {
        let backend = InMemoryBackend::new();
        let id = MetricId::new("test", "gauge");
        backend.put_metric(Metric::new_gauge(id.clone(), "g", "bytes")).unwrap();
        assert_eq!(
            backend.increment_counter(&id, 1),
            Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: MetricType::Gauge,
            })
        );
    }

    #[test]
    fn test_histogram_buckets_are_cumulative() {
        let backend = InMemoryBackend::new();
        let id = MetricId::new("test", "latency");
        backend
            .put_metric(Metric::new_histogram(id.clone(), "l", "ms", vec![1.0, 10.0]))
            .unwrap();
        for sample in [0.5, 5.0, 50.0] {
            backend.record_histogram_sample(&id, sample).unwrap();
        }
        match backend.get_metric(&id).unwrap().value {
            MetricValue::Histogram {
                count,
                sum,
                bucket_counts,
                ..
            } => {
                assert_eq!(count, 3);
                assert_eq!(sum, 55.5);
                assert_eq!(bucket_counts, vec![1, 2]);
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn test_concurrent_increments_are_exact() {
        let backend = Arc::new(InMemoryBackend::new());
        let id = MetricId::new("test", "hits");
        backend.put_metric(Metric::new_counter(id.clone(), "")).unwrap();

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let backend = backend.clone();
                let id = id.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        backend.increment_counter(&id, 1).unwrap();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(backend.get_metric(&id).unwrap().value.as_counter(), Some(8000));
    }
}
