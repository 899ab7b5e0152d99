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

#![allow(dead_code)]

use async_trait::async_trait;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::Semaphore;
use vitrine_cache::{CacheConfig, ResourceCache};
use vitrine_core::{
    math::{LinearRgba, Transform, Vec3},
    resource::{ResourceDevice, ResourceKind, Shared, TrackingDevice},
    scene::{Geometry, Texture, TextureSlot},
    AssetId, AssetLoader, DecodeError, LoadProgress, Material, NodeKind, ProgressObserver,
    SceneGraph, SceneNode,
};

/// Total size reported by [`GatedLoader`] progress.
pub const ASSET_BYTES: u64 = 100;

/// A loader that builds a small car scene once a permit is available.
///
/// Each load reports half progress, waits on the gate, reports completion
/// and then succeeds or fails depending on [`GatedLoader::set_failing`].
pub struct GatedLoader {
    pub device: Arc<TrackingDevice>,
    gate: Semaphore,
    loads: AtomicUsize,
    failing: AtomicBool,
}

impl GatedLoader {
    /// A loader that blocks every load until [`open`](Self::open) is called.
    pub fn closed() -> Arc<Self> {
        Arc::new(Self {
            device: Arc::new(TrackingDevice::new()),
            gate: Semaphore::new(0),
            loads: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        })
    }

    /// A loader that never blocks.
    pub fn open_ended() -> Arc<Self> {
        let loader = Self::closed();
        loader.gate.add_permits(Semaphore::MAX_PERMITS / 2);
        loader
    }

    /// Lets `n` loads through.
    pub fn open(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// How many loads were started.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetLoader for GatedLoader {
    async fn load(
        &self,
        id: &AssetId,
        progress: &dyn ProgressObserver,
    ) -> Result<SceneGraph, DecodeError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        progress.on_progress(LoadProgress::new(ASSET_BYTES / 2, Some(ASSET_BYTES)));
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| DecodeError::transport(id, e))?;
        permit.forget();
        progress.on_progress(LoadProgress::new(ASSET_BYTES, Some(ASSET_BYTES)));

        if self.failing.load(Ordering::SeqCst) {
            return Err(DecodeError::malformed(id, "corrupt header"));
        }
        Ok(car(&self.device))
    }
}

/// car(group) -> body(mesh, textured) -> wheel(geometry only)
pub fn car(device: &Arc<TrackingDevice>) -> SceneGraph {
    let device: Arc<dyn ResourceDevice> = device.clone();
    let shared_geometry = |label: &str| {
        let data = Geometry::triangle();
        Shared::new(
            device.clone(),
            ResourceKind::Geometry,
            label,
            data.byte_size(),
            data,
        )
    };

    let texture = Shared::new(
        device.clone(),
        ResourceKind::Texture,
        "paint.png",
        4,
        Texture::solid([200, 20, 20, 255]),
    );
    let mut paint = Material::standard(LinearRgba::rgb(0.8, 0.1, 0.1));
    paint.name = Some("paint".into());
    paint.set_texture(TextureSlot::Map, Some(texture));
    let material = Shared::new(
        device.clone(),
        ResourceKind::Material,
        "paint",
        Material::UNIFORM_BYTES,
        paint,
    );

    let mut graph = SceneGraph::new();
    let root = graph
        .add_root(SceneNode::group().with_name("car"))
        .unwrap();
    let body = graph
        .add_child(
            root,
            SceneNode::new(NodeKind::Mesh {
                geometry: shared_geometry("body"),
                material,
            })
            .with_name("body")
            .with_transform(Transform::from_translation(Vec3::new(0.0, 0.5, 0.0))),
        )
        .unwrap();
    graph
        .add_child(
            body,
            SceneNode::new(NodeKind::Geometry {
                geometry: shared_geometry("wheel"),
            })
            .with_name("wheel"),
        )
        .unwrap();
    graph
}

pub fn cache_with(loader: &Arc<GatedLoader>) -> ResourceCache {
    ResourceCache::new(loader.clone(), CacheConfig::default()).unwrap()
}

/// Polls `condition` until it holds, failing the test after a few seconds.
pub async fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
