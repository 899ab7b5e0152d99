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

use crate::resource::Shared;
use std::ops::AddAssign;

/// What a call to [`SceneGraph::dispose`](super::SceneGraph::dispose) did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeReport {
    /// Nodes disposed, groups included.
    pub nodes: usize,
    /// References dropped, one per geometry, material and texture slot.
    pub released: usize,
    /// Resources whose count reached zero and were freed on the device.
    pub freed: usize,
}

impl DisposeReport {
    /// Drops one reference and records whether it was the last one.
    pub(crate) fn release<T>(&mut self, resource: Shared<T>) {
        let watch = resource.watch();
        drop(resource);
        self.released += 1;
        if watch.is_disposed() {
            self.freed += 1;
        }
    }
}

impl AddAssign for DisposeReport {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes += rhs.nodes;
        self.released += rhs.released;
        self.freed += rhs.freed;
    }
}
