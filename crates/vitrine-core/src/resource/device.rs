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

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque identifier for a resource allocated on a [`ResourceDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res#{}", self.0)
    }
}

/// The category of a GPU-resident resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Vertex and index buffers.
    Geometry,
    /// A material's uniform data and pipeline state.
    Material,
    /// Image data sampled by materials.
    Texture,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Geometry => "geometry",
            ResourceKind::Material => "material",
            ResourceKind::Texture => "texture",
        };
        f.write_str(name)
    }
}

/// The seam between the scene graph and whatever owns GPU memory.
///
/// A rendering backend implements this by creating and destroying real
/// buffers; headless code uses [`TrackingDevice`](super::TrackingDevice).
/// Implementations must tolerate calls from any thread.
pub trait ResourceDevice: Send + Sync {
    /// Reserves a resource of `bytes` size and returns its identifier.
    fn allocate(&self, kind: ResourceKind, label: &str, bytes: u64) -> ResourceId;

    /// Frees a resource previously returned by [`ResourceDevice::allocate`].
    ///
    /// Freeing an unknown or already freed id is a bug in the caller; devices
    /// should report it rather than panic.
    fn free(&self, id: ResourceId);
}
