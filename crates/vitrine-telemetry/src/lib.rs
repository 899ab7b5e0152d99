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

//! # Vitrine Telemetry
//!
//! Counters, gauges and histograms for the asset pipeline.
//!
//! Metrics are registered once on a [`MetricsRegistry`], which hands back
//! cheap, cloneable handles. Handles write straight to a shared
//! [`MetricsBackend`]; the default backend keeps everything in memory so
//! tests and tools can read values back.

#![warn(missing_docs)]

pub mod metrics;
pub mod storage;
pub mod utils;

pub use metrics::{
    CounterHandle, GaugeHandle, HistogramHandle, Metric, MetricId, MetricType, MetricValue,
    MetricsError, MetricsRegistry, MetricsResult,
};
pub use storage::{InMemoryBackend, MetricsBackend};
pub use utils::ScopedMetricTimer;
