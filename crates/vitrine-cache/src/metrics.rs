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

use vitrine_telemetry::{
    CounterHandle, GaugeHandle, HistogramHandle, MetricId, MetricsRegistry, MetricsResult,
    ScopedMetricTimer,
};

/// Namespace under which every cache metric is registered.
pub const METRICS_NAMESPACE: &str = "asset_cache";

/// Handles to the cache's metrics.
///
/// Metric writes never fail an operation; a failed write is logged and
/// otherwise ignored.
#[derive(Debug, Clone)]
pub(crate) struct CacheMetrics {
    acquire_total: CounterHandle,
    hit_total: CounterHandle,
    join_total: CounterHandle,
    decode_total: CounterHandle,
    decode_failed_total: CounterHandle,
    release_total: CounterHandle,
    evict_total: CounterHandle,
    cached_entries: GaugeHandle,
    outstanding_checkouts: GaugeHandle,
    /// Loader time in milliseconds.
    decode_time: HistogramHandle,
}

impl CacheMetrics {
    pub(crate) fn register(registry: &MetricsRegistry) -> MetricsResult<Self> {
        let id = |name: &str| MetricId::new(METRICS_NAMESPACE, name);
        Ok(Self {
            acquire_total: registry
                .register_counter(id("acquire_total"), "Calls to acquire, hits included")?,
            hit_total: registry
                .register_counter(id("hit_total"), "Acquires served from a cached instance")?,
            join_total: registry
                .register_counter(id("join_total"), "Acquires that joined a pending load")?,
            decode_total: registry.register_counter(id("decode_total"), "Loads started")?,
            decode_failed_total: registry
                .register_counter(id("decode_failed_total"), "Loads that failed")?,
            release_total: registry
                .register_counter(id("release_total"), "Checkouts released or dropped")?,
            evict_total: registry
                .register_counter(id("evict_total"), "Cached instances evicted")?,
            cached_entries: registry.register_gauge(
                id("cached_entries"),
                "Canonical instances currently cached",
                "entries",
            )?,
            outstanding_checkouts: registry.register_gauge(
                id("outstanding_checkouts"),
                "Handles issued and not yet released",
                "handles",
            )?,
            decode_time: registry.register_histogram(
                id("decode_time"),
                "Time spent in the loader per load",
                "ms",
                vec![1.0, 5.0, 16.0, 33.0, 100.0, 500.0, 2000.0],
            )?,
        })
    }

    pub(crate) fn acquire(&self) {
        bump(&self.acquire_total);
    }

    pub(crate) fn hit(&self) {
        bump(&self.hit_total);
    }

    pub(crate) fn join(&self) {
        bump(&self.join_total);
    }

    pub(crate) fn decode_started(&self) {
        bump(&self.decode_total);
    }

    pub(crate) fn decode_failed(&self) {
        bump(&self.decode_failed_total);
    }

    pub(crate) fn released(&self) {
        bump(&self.release_total);
    }

    pub(crate) fn evicted(&self) {
        bump(&self.evict_total);
    }

    pub(crate) fn set_cached_entries(&self, count: usize) {
        set(&self.cached_entries, count);
    }

    pub(crate) fn set_outstanding(&self, count: usize) {
        set(&self.outstanding_checkouts, count);
    }

    /// Starts timing a load; the sample is recorded when the timer drops.
    pub(crate) fn decode_timer(&self) -> ScopedMetricTimer<'_> {
        ScopedMetricTimer::new(&self.decode_time)
    }
}

fn bump(counter: &CounterHandle) {
    if let Err(e) = counter.increment() {
        log::warn!("Failed to update metric {}: {e}", counter.id());
    }
}

fn set(gauge: &GaugeHandle, value: usize) {
    if let Err(e) = gauge.set(value as f64) {
        log::warn!("Failed to update metric {}: {e}", gauge.id());
    }
}
