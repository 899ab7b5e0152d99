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

use std::sync::atomic::{AtomicUsize, Ordering};

/// The sample models shipped with the site, in presentation order.
pub const SAMPLE_MODELS: [&str; 4] = [
    "/models/scene.glb",
    "/models/gltf/CesiumMan/CesiumMan.gltf",
    "/models/gltf/Duck/Duck.gltf",
    "/models/gltf/Lantern/Lantern.gltf",
];

/// Hands out sample model identifiers round-robin.
#[derive(Debug, Default)]
pub struct SampleCatalog {
    cursor: AtomicUsize,
}

impl SampleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next identifier, wrapping around after the last one.
    pub fn next_model(&self) -> &'static str {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % SAMPLE_MODELS.len();
        SAMPLE_MODELS[index]
    }

    /// One full pass over the catalog starting at the cursor.
    pub fn pass(&self) -> Vec<&'static str> {
        (0..SAMPLE_MODELS.len()).map(|_| self.next_model()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_around() {
        let catalog = SampleCatalog::new();
        let first: Vec<_> = (0..5).map(|_| catalog.next_model()).collect();
        assert_eq!(first[0], "/models/scene.glb");
        assert_eq!(first[3], "/models/gltf/Lantern/Lantern.gltf");
        assert_eq!(first[4], first[0]);
        assert_eq!(catalog.pass()[0], "/models/gltf/CesiumMan/CesiumMan.gltf");
    }
}
