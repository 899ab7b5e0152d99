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

use super::{AssetId, DecodeError, ProgressObserver};
use crate::scene::SceneGraph;
use async_trait::async_trait;

/// The asynchronous contract that turns an identifier into a decoded scene.
///
/// A loader owns the whole "bytes to scene" path: fetching, parsing and
/// uploading resources to a [`ResourceDevice`](crate::resource::ResourceDevice).
/// The returned graph is the *master*: its resources start with one
/// reference held by the graph itself.
///
/// Implementations must be safe to call concurrently for different
/// identifiers. The cache guarantees at most one in-flight call per
/// identifier.
#[async_trait]
pub trait AssetLoader: Send + Sync + 'static {
    /// Loads and decodes the asset named by `id`.
    ///
    /// Progress should be reported through `progress` whenever the transport
    /// knows about new bytes; reporting nothing at all is allowed.
    async fn load(
        &self,
        id: &AssetId,
        progress: &dyn ProgressObserver,
    ) -> Result<SceneGraph, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::LoadProgress;
    use crate::scene::SceneNode;
    use std::sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    };

    struct EchoLoader;

    #[async_trait]
    impl AssetLoader for EchoLoader {
        async fn load(
            &self,
            id: &AssetId,
            progress: &dyn ProgressObserver,
        ) -> Result<SceneGraph, DecodeError> {
            if id.as_str().ends_with(".bad") {
                return Err(DecodeError::malformed(id, "bad magic"));
            }
            progress.on_progress(LoadProgress::new(10, Some(10)));
            let mut graph = SceneGraph::new();
            graph
                .add_root(SceneNode::group().with_name(id.as_str()))
                .map_err(|e| DecodeError::malformed(id, e))?;
            Ok(graph)
        }
    }

    #[tokio::test]
    async fn test_loader_is_object_safe() {
        let loader: Arc<dyn AssetLoader> = Arc::new(EchoLoader);
        let seen = AtomicU64::new(0);
        let observer = |p: LoadProgress| seen.store(p.loaded, Ordering::SeqCst);

        let graph = loader
            .load(&AssetId::parse("a.glb").unwrap(), &observer)
            .await
            .unwrap();
        assert!(graph.find_by_name("a.glb").is_some());
        assert_eq!(seen.load(Ordering::SeqCst), 10);

        let err = loader
            .load(&AssetId::parse("a.bad").unwrap(), &observer)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Malformed asset 'a.bad': bad magic");
    }
}
