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

//! Defines the abstraction for resolving external resources for complex asset formats like glTF.

use crate::asset_lane::source::relative_path;
use std::error::Error;
use std::path::{Path, PathBuf};
use vitrine_core::AssetId;

/// Resolves external resources (buffers or images) referenced by a URI
/// within an asset file.
///
/// URIs are relative to the asset that references them, so the referencing
/// asset is passed along.
pub trait GltfResourceResolver: Send + Sync {
    /// Resolves an external buffer URI to its binary data.
    fn resolve_buffer(
        &self,
        asset: &AssetId,
        uri: &str,
    ) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>>;

    /// Resolves an external image URI to its binary data.
    fn resolve_image(
        &self,
        asset: &AssetId,
        uri: &str,
    ) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>>;
}

/// Resolves resources from the local file system, next to the asset file.
#[derive(Debug, Clone)]
pub struct FileSystemResolver {
    base_path: PathBuf,
}

impl FileSystemResolver {
    /// Creates a resolver for assets stored below `base_path`.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn path_for(
        &self,
        asset: &AssetId,
        uri: &str,
    ) -> Result<PathBuf, Box<dyn Error + Send + Sync>> {
        let asset_dir = relative_path(asset.as_str())
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let relative = relative_path(uri)
            .ok_or_else(|| format!("URI '{uri}' escapes the asset directory"))?;
        Ok(self.base_path.join(asset_dir).join(relative))
    }

    fn read(
        &self,
        what: &str,
        asset: &AssetId,
        uri: &str,
    ) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        let path = self.path_for(asset, uri)?;
        std::fs::read(&path).map_err(|e| {
            format!("Failed to read external {what} from '{}': {e}", path.display()).into()
        })
    }
}

impl GltfResourceResolver for FileSystemResolver {
    fn resolve_buffer(
        &self,
        asset: &AssetId,
        uri: &str,
    ) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        self.read("buffer", asset, uri)
    }

    fn resolve_image(
        &self,
        asset: &AssetId,
        uri: &str,
    ) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        self.read("image", asset, uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uris_resolve_next_to_the_asset() {
        let resolver = FileSystemResolver::new("/srv/public");
        let asset = AssetId::parse("/models/gltf/Duck/Duck.gltf").unwrap();
        assert_eq!(
            resolver.path_for(&asset, "Duck0.bin").unwrap(),
            PathBuf::from("/srv/public/models/gltf/Duck/Duck0.bin")
        );
        assert!(resolver.path_for(&asset, "../../etc/passwd").is_err());
    }
}
