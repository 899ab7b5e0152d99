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

//! Byte sources: where asset bytes come from.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tokio::io::AsyncReadExt;
use vitrine_core::{AssetId, DecodeError, LoadProgress, ProgressObserver};

/// Default read size for chunked sources.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Errors raised while fetching asset bytes.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Nothing exists behind the identifier.
    #[error("no asset at '{0}'")]
    NotFound(String),
    /// The identifier would resolve outside of the source root.
    #[error("'{0}' escapes the asset root")]
    EscapesRoot(String),
    /// Reading failed.
    #[error("failed to read '{path}'")]
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    /// Maps this error onto the loader contract.
    pub fn into_decode_error(self, id: &AssetId) -> DecodeError {
        match self {
            SourceError::NotFound(_) => DecodeError::NotFound(id.clone()),
            other => DecodeError::transport(id, other),
        }
    }
}

/// Fetches the raw bytes of an asset.
#[async_trait]
pub trait AssetSource: Send + Sync + 'static {
    /// Reads every byte behind `id`, reporting progress as chunks arrive.
    async fn fetch(
        &self,
        id: &AssetId,
        progress: &dyn ProgressObserver,
    ) -> Result<Vec<u8>, SourceError>;
}

/// Turns an identifier (or a URI found inside an asset) into a relative path.
///
/// Query strings and fragments are dropped and leading slashes ignored, so
/// web-style ids like `/models/duck.glb?v=2` map below the root. `..` and
/// drive prefixes are rejected.
pub(crate) fn relative_path(raw: &str) -> Option<PathBuf> {
    let path = raw.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_start_matches('/');
    let mut out = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}

/// Reads assets from a directory on the local file system.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
    chunk_size: usize,
}

impl FileSystemSource {
    /// Serves files below `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Overrides the read size (and so the progress granularity).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// The directory assets are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file an identifier maps to.
    pub fn resolve(&self, id: &AssetId) -> Result<PathBuf, SourceError> {
        relative_path(id.as_str())
            .map(|relative| self.root.join(relative))
            .ok_or_else(|| SourceError::EscapesRoot(id.to_string()))
    }
}

#[async_trait]
impl AssetSource for FileSystemSource {
    async fn fetch(
        &self,
        id: &AssetId,
        progress: &dyn ProgressObserver,
    ) -> Result<Vec<u8>, SourceError> {
        let path = self.resolve(id)?;
        let io_error = |source: std::io::Error| match source.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(id.to_string()),
            _ => SourceError::Io {
                path: path.clone(),
                source,
            },
        };

        let mut file = tokio::fs::File::open(&path).await.map_err(io_error)?;
        let total = file.metadata().await.map_err(io_error)?.len();
        log::debug!("Reading '{}' ({total} bytes)", path.display());

        let mut bytes = Vec::with_capacity(total as usize);
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            let read = file.read(&mut chunk).await.map_err(io_error)?;
            if read == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..read]);
            progress.on_progress(LoadProgress::new(bytes.len() as u64, Some(total)));
        }
        Ok(bytes)
    }
}

/// Serves assets registered in memory. Useful for tests and embedded assets.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    entries: Arc<RwLock<ahash::AHashMap<String, Arc<[u8]>>>>,
    chunk_size: Option<usize>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports progress every `chunk_size` bytes instead of once at the end.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    /// Registers (or replaces) the bytes served for `id`.
    pub fn insert(&self, id: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.entries.write().insert(id.into(), bytes.into());
    }

    /// Unregisters `id`. Returns whether it was present.
    pub fn remove(&self, id: &str) -> bool {
        self.entries.write().remove(id).is_some()
    }
}

#[async_trait]
impl AssetSource for MemorySource {
    async fn fetch(
        &self,
        id: &AssetId,
        progress: &dyn ProgressObserver,
    ) -> Result<Vec<u8>, SourceError> {
        let bytes = self
            .entries
            .read()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))?;

        let total = bytes.len() as u64;
        let step = self.chunk_size.unwrap_or(bytes.len()).max(1);
        let mut loaded = 0usize;
        while loaded < bytes.len() {
            loaded = (loaded + step).min(bytes.len());
            progress.on_progress(LoadProgress::new(loaded as u64, Some(total)));
        }
        Ok(bytes.to_vec())
    }
}
