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

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vitrine_core::math::LinearRgba;

/// Tunables of a [`ResourceCache`](crate::ResourceCache).
///
/// Every field has a default, so a RON file only needs to name what it
/// overrides:
///
/// ```
/// use vitrine_cache::CacheConfig;
///
/// let config = CacheConfig::from_ron_str("(default_material_color: 0xff0000)").unwrap();
/// assert!(config.apply_default_materials);
/// assert_eq!(config.default_material_color, 0xff0000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Give every material-less geometry node a standard material before the
    /// decoded scene is stored.
    pub apply_default_materials: bool,
    /// sRGB color (`0xRRGGBB`) of those default materials.
    pub default_material_color: u32,
    /// Identifiers longer than this many bytes are rejected.
    pub max_identifier_len: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            apply_default_materials: true,
            default_material_color: 0x808080,
            max_identifier_len: 2048,
        }
    }
}

impl CacheConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;
        log::debug!("Loaded cache config from '{}'", path.display());
        Ok(config)
    }

    /// Writes the configuration as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// The default material color converted to linear space.
    pub fn default_material_rgba(&self) -> LinearRgba {
        LinearRgba::from_srgb_u32(self.default_material_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(CacheConfig::from_ron_str("()").unwrap(), CacheConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config =
            CacheConfig::from_ron_str("(apply_default_materials: false, max_identifier_len: 16)")
                .unwrap();
        assert!(!config.apply_default_materials);
        assert_eq!(config.max_identifier_len, 16);
        assert_eq!(config.default_material_color, 0x808080);
    }

    #[test]
    fn test_round_trips_through_ron() {
        let config = CacheConfig {
            default_material_color: 0x123456,
            ..Default::default()
        };
        let text = config.to_ron_string().unwrap();
        assert_eq!(CacheConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_unknown_types() {
        assert!(matches!(
            CacheConfig::from_ron_str("(max_identifier_len: \"long\")"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.ron");
        std::fs::write(&path, "(default_material_color: 0x000000)").unwrap();
        assert_eq!(CacheConfig::load(&path).unwrap().default_material_color, 0);
        assert!(matches!(
            CacheConfig::load(dir.path().join("missing.ron")),
            Err(ConfigError::Io { .. })
        ));
    }
}
