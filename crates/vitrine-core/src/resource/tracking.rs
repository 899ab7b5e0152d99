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

use super::{ResourceDevice, ResourceId, ResourceKind};
use parking_lot::Mutex;
use std::collections::HashMap;

/// A snapshot of the allocations tracked by a [`TrackingDevice`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    // --- Current State ---
    /// Number of resources currently allocated.
    pub live_resources: usize,
    /// Bytes currently allocated.
    pub live_bytes: u64,
    /// The maximum number of bytes that were ever allocated simultaneously.
    pub peak_bytes: u64,

    // --- Lifetime Totals ---
    /// Total number of `allocate` calls.
    pub total_allocations: u64,
    /// Total number of successful `free` calls.
    pub total_frees: u64,
    /// Cumulative sum of all bytes ever allocated.
    pub bytes_allocated_lifetime: u64,

    // --- Misuse ---
    /// `free` calls naming an unknown or already freed resource.
    pub invalid_frees: u64,
}

#[derive(Debug)]
struct Allocation {
    kind: ResourceKind,
    label: String,
    bytes: u64,
}

#[derive(Debug, Default)]
struct TrackingState {
    next_id: u64,
    live: HashMap<ResourceId, Allocation>,
    stats: MemoryStats,
}

/// A headless [`ResourceDevice`] that only keeps books.
///
/// Used wherever no GPU is available: tests, the sandbox, server-side
/// preprocessing.
#[derive(Debug, Default)]
pub struct TrackingDevice {
    state: Mutex<TrackingState>,
}

impl TrackingDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the current counters.
    pub fn stats(&self) -> MemoryStats {
        self.state.lock().stats
    }

    /// Number of live resources of the given kind.
    pub fn live_of(&self, kind: ResourceKind) -> usize {
        self.state
            .lock()
            .live
            .values()
            .filter(|a| a.kind == kind)
            .count()
    }

    /// Returns `true` if `id` is currently allocated.
    pub fn is_live(&self, id: ResourceId) -> bool {
        self.state.lock().live.contains_key(&id)
    }

    /// Labels of all live resources, sorted. Handy when hunting leaks.
    pub fn live_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .state
            .lock()
            .live
            .values()
            .map(|a| format!("{}:{}", a.kind, a.label))
            .collect();
        labels.sort();
        labels
    }
}

impl ResourceDevice for TrackingDevice {
    fn allocate(&self, kind: ResourceKind, label: &str, bytes: u64) -> ResourceId {
        let mut state = self.state.lock();
        let id = ResourceId(state.next_id);
        state.next_id += 1;
        state.live.insert(
            id,
            Allocation {
                kind,
                label: label.to_owned(),
                bytes,
            },
        );

        let stats = &mut state.stats;
        stats.live_resources += 1;
        stats.live_bytes += bytes;
        stats.peak_bytes = stats.peak_bytes.max(stats.live_bytes);
        stats.total_allocations += 1;
        stats.bytes_allocated_lifetime += bytes;
        id
    }

    fn free(&self, id: ResourceId) {
        let mut state = self.state.lock();
        match state.live.remove(&id) {
            Some(allocation) => {
                let stats = &mut state.stats;
                stats.live_resources -= 1;
                stats.live_bytes -= allocation.bytes;
                stats.total_frees += 1;
            }
            None => {
                state.stats.invalid_frees += 1;
                log::error!("Attempted to free unknown resource {id}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_track_live_and_peak() {
        let device = TrackingDevice::new();
        let a = device.allocate(ResourceKind::Geometry, "a", 100);
        let b = device.allocate(ResourceKind::Texture, "b", 50);
        device.free(a);
        let stats = device.stats();
        assert_eq!(stats.live_resources, 1);
        assert_eq!(stats.live_bytes, 50);
        assert_eq!(stats.peak_bytes, 150);
        assert_eq!(stats.total_allocations, 2);
        assert_eq!(stats.total_frees, 1);
        assert!(device.is_live(b));
        assert_eq!(device.live_of(ResourceKind::Texture), 1);
        assert_eq!(device.live_labels(), vec!["texture:b".to_string()]);
    }

    #[test]
    fn test_double_free_is_counted_not_applied() {
        let device = TrackingDevice::new();
        let a = device.allocate(ResourceKind::Material, "a", 10);
        device.free(a);
        device.free(a);
        let stats = device.stats();
        assert_eq!(stats.invalid_frees, 1);
        assert_eq!(stats.total_frees, 1);
        assert_eq!(stats.live_bytes, 0);
    }
}
