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

mod common;

use async_trait::async_trait;
use common::{cache_with, GatedLoader};
use std::sync::Arc;
use vitrine_cache::{AssetState, CacheConfig, LoadError, ResourceCache, METRICS_NAMESPACE};
use vitrine_core::{
    resource::{ResourceKind, Shared, TrackingDevice},
    scene::Geometry,
    AssetId, AssetLoader, DecodeError, NodeKind, ProgressObserver, ResourceDevice, SceneGraph,
    SceneNode,
};
use vitrine_lanes::{FileSystemSource, MemorySource, PipelineLoader, SceneDecoder};
use vitrine_telemetry::{MetricId, MetricsRegistry};

struct Explodes;

#[async_trait]
impl AssetLoader for Explodes {
    async fn load(
        &self,
        _id: &AssetId,
        _progress: &dyn ProgressObserver,
    ) -> Result<SceneGraph, DecodeError> {
        panic!("loader bug");
    }
}

#[tokio::test]
async fn test_panicking_load_is_abandoned() {
    let cache = ResourceCache::new(Arc::new(Explodes), CacheConfig::default()).unwrap();
    let err = cache.acquire("a.glb").await.unwrap_err();
    assert!(matches!(err, LoadError::LoadAbandoned { ref id } if id.as_str() == "a.glb"));
    assert_eq!(cache.state("a.glb"), AssetState::Absent);
}

#[tokio::test]
async fn test_metrics_follow_the_lifecycle() {
    let loader = GatedLoader::open_ended();
    let registry = MetricsRegistry::new();
    let cache =
        ResourceCache::with_metrics(loader.clone(), CacheConfig::default(), &registry).unwrap();

    let a = cache.acquire("a.glb").await.unwrap();
    let b = cache.acquire("a.glb").await.unwrap();
    cache.release(a).unwrap();
    drop(b);
    assert!(cache.evict_if_unused("a.glb"));

    let metric = |name: &str| {
        registry
            .get_metric(&MetricId::new(METRICS_NAMESPACE, name))
            .unwrap()
            .value
    };
    assert_eq!(metric("acquire_total").as_counter(), Some(2));
    assert_eq!(metric("hit_total").as_counter(), Some(1));
    assert_eq!(metric("join_total").as_counter(), Some(0));
    assert_eq!(metric("decode_total").as_counter(), Some(1));
    assert_eq!(metric("decode_failed_total").as_counter(), Some(0));
    assert_eq!(metric("release_total").as_counter(), Some(2));
    assert_eq!(metric("evict_total").as_counter(), Some(1));
    assert_eq!(metric("cached_entries").as_gauge(), Some(0.0));
    assert_eq!(metric("outstanding_checkouts").as_gauge(), Some(0.0));
    assert_eq!(metric("decode_time").histogram_count(), Some(1));

    let json = registry.namespace_to_json(METRICS_NAMESPACE).unwrap();
    assert!(json.contains("hit_total"));
}

/// One geometry node per non-empty line of text.
struct LineDecoder;

impl SceneDecoder for LineDecoder {
    fn decode(
        &self,
        id: &AssetId,
        bytes: &[u8],
        device: &Arc<dyn ResourceDevice>,
    ) -> Result<SceneGraph, DecodeError> {
        let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::malformed(id, e))?;
        let mut graph = SceneGraph::new();
        let root = graph
            .add_root(SceneNode::group().with_name(id.as_str()))
            .map_err(|e| DecodeError::malformed(id, e))?;
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let data = Geometry::triangle();
            let geometry = Shared::new(
                device.clone(),
                ResourceKind::Geometry,
                line,
                data.byte_size(),
                data,
            );
            graph
                .add_child(root, SceneNode::new(NodeKind::Geometry { geometry }).with_name(line))
                .map_err(|e| DecodeError::malformed(id, e))?;
        }
        Ok(graph)
    }
}

#[tokio::test]
async fn test_cache_over_memory_pipeline() {
    let device = Arc::new(TrackingDevice::new());
    let source = MemorySource::new();
    source.insert("props.txt", b"chair\ntable\n\nlamp\n".to_vec());
    let loader = PipelineLoader::new(source, LineDecoder, device.clone());
    let cache = ResourceCache::new(Arc::new(loader), CacheConfig::default()).unwrap();

    let handle = cache.acquire("props.txt").await.unwrap();
    assert_eq!(handle.root().len(), 4);
    // default materials turned every line into a mesh
    assert_eq!(handle.root().mesh_count(), 3);

    let missing = cache.acquire("nothing.txt").await.unwrap_err();
    assert!(matches!(missing.decode_error(), Some(DecodeError::NotFound(_))));

    cache.release(handle).unwrap();
    assert_eq!(cache.evict_all_unused(), 1);
    assert_eq!(device.stats().live_resources, 0);
}

#[tokio::test]
async fn test_cache_over_file_system_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("models")).unwrap();
    std::fs::write(dir.path().join("models/set.txt"), "stage\nscreen\n").unwrap();

    let device = Arc::new(TrackingDevice::new());
    let loader = PipelineLoader::new(FileSystemSource::new(dir.path()), LineDecoder, device.clone());
    let cache = ResourceCache::new(Arc::new(loader), CacheConfig::default()).unwrap();

    let first = cache.acquire("models/set.txt").await.unwrap();
    let second = cache.acquire("models/set.txt").await.unwrap();
    assert!(first.root().find_by_name("screen").is_some());
    assert_eq!(cache.outstanding_for("models/set.txt"), 2);
    // a different spelling is a different asset
    assert!(cache.try_acquire("./models/set.txt").is_none());

    cache.release(first).unwrap();
    cache.release(second).unwrap();
    assert!(cache.evict_if_unused("models/set.txt"));
    assert_eq!(device.stats().live_resources, 0);
}

#[test]
fn test_cache_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync + Clone + 'static>() {}
    assert_send_sync::<ResourceCache>();

    let loader = GatedLoader::open_ended();
    let cache = cache_with(&loader);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .build()
        .unwrap();
    let handles = runtime.block_on(async {
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    let id = if i % 2 == 0 { "even.glb" } else { "odd.glb" };
                    cache.acquire(id).await
                })
            })
            .collect();
        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }
        handles
    });
    assert_eq!(loader.loads(), 2);
    assert_eq!(cache.outstanding_checkouts(), 16);
    for handle in handles {
        cache.release(handle).unwrap();
    }
    assert_eq!(cache.evict_all_unused(), 2);
    drop(runtime);
    assert_eq!(loader.device.stats().live_resources, 0);
}
