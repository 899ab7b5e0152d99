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

use super::AssetSource;
use async_trait::async_trait;
use std::sync::Arc;
use vitrine_core::{
    AssetId, AssetLoader, DecodeError, ProgressObserver, ResourceDevice, SceneGraph,
};

/// Parses fetched bytes into a scene graph.
///
/// This is the CPU-heavy part of loading. Implementors parse and decode raw
/// file data and register every GPU-resident resource they create on
/// `device`. Decoding is synchronous; [`PipelineLoader`] runs it on the
/// blocking thread pool.
pub trait SceneDecoder: Send + Sync + 'static {
    /// Decodes `bytes`, fetched for `id`, into a new scene graph.
    fn decode(
        &self,
        id: &AssetId,
        bytes: &[u8],
        device: &Arc<dyn ResourceDevice>,
    ) -> Result<SceneGraph, DecodeError>;

    /// Returns `false` when this decoder certainly cannot handle `id`.
    fn supports(&self, _id: &AssetId) -> bool {
        true
    }
}

/// An [`AssetLoader`] made of a byte source and a decoder.
pub struct PipelineLoader<S, D> {
    source: S,
    decoder: Arc<D>,
    device: Arc<dyn ResourceDevice>,
}

impl<S: AssetSource, D: SceneDecoder> PipelineLoader<S, D> {
    /// Creates a loader reading from `source`, decoding with `decoder` and
    /// allocating resources on `device`.
    pub fn new(source: S, decoder: D, device: Arc<dyn ResourceDevice>) -> Self {
        Self {
            source,
            decoder: Arc::new(decoder),
            device,
        }
    }

    /// The byte source.
    pub fn source(&self) -> &S {
        &self.source
    }
}

#[async_trait]
impl<S: AssetSource, D: SceneDecoder> AssetLoader for PipelineLoader<S, D> {
    async fn load(
        &self,
        id: &AssetId,
        progress: &dyn ProgressObserver,
    ) -> Result<SceneGraph, DecodeError> {
        if !self.decoder.supports(id) {
            return Err(DecodeError::Unsupported {
                id: id.clone(),
                format: id.extension().unwrap_or_default(),
            });
        }

        let bytes = self
            .source
            .fetch(id, progress)
            .await
            .map_err(|e| e.into_decode_error(id))?;
        log::trace!("Fetched {} bytes for '{id}', decoding", bytes.len());

        let decoder = Arc::clone(&self.decoder);
        let device = Arc::clone(&self.device);
        let task_id = id.clone();
        tokio::task::spawn_blocking(move || decoder.decode(&task_id, &bytes, &device))
            .await
            .map_err(|e| DecodeError::malformed(id, format!("decoder task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySource;
    use vitrine_core::{asset::IgnoreProgress, SceneNode, TrackingDevice};

    struct NameDecoder;

    impl SceneDecoder for NameDecoder {
        fn decode(
            &self,
            id: &AssetId,
            bytes: &[u8],
            _device: &Arc<dyn ResourceDevice>,
        ) -> Result<SceneGraph, DecodeError> {
            let name = std::str::from_utf8(bytes).map_err(|e| DecodeError::malformed(id, e))?;
            let mut graph = SceneGraph::new();
            graph
                .add_root(SceneNode::group().with_name(name))
                .map_err(|e| DecodeError::malformed(id, e))?;
            Ok(graph)
        }

        fn supports(&self, id: &AssetId) -> bool {
            id.extension().as_deref() == Some("txt")
        }
    }

    fn loader(source: MemorySource) -> PipelineLoader<MemorySource, NameDecoder> {
        PipelineLoader::new(source, NameDecoder, Arc::new(TrackingDevice::new()))
    }

    #[tokio::test]
    async fn test_pipeline_fetches_then_decodes() {
        let source = MemorySource::new();
        source.insert("hello.txt", b"hello".to_vec());
        let graph = loader(source)
            .load(&AssetId::parse("hello.txt").unwrap(), &IgnoreProgress)
            .await
            .unwrap();
        assert!(graph.find_by_name("hello").is_some());
    }

    #[tokio::test]
    async fn test_pipeline_maps_errors() {
        let source = MemorySource::new();
        source.insert("bad.txt", vec![0xff, 0xfe]);
        let loader = loader(source);

        let unsupported = loader
            .load(&AssetId::parse("a.glb").unwrap(), &IgnoreProgress)
            .await;
        assert!(matches!(unsupported, Err(DecodeError::Unsupported { .. })));

        let missing = loader
            .load(&AssetId::parse("missing.txt").unwrap(), &IgnoreProgress)
            .await;
        assert!(matches!(missing, Err(DecodeError::NotFound(_))));

        let malformed = loader
            .load(&AssetId::parse("bad.txt").unwrap(), &IgnoreProgress)
            .await;
        assert!(matches!(malformed, Err(DecodeError::Malformed { .. })));
    }
}
