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

use super::Texture;
use crate::{math::LinearRgba, resource::Shared};
use std::fmt;

/// Specifies how a material handles transparency.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AlphaMode {
    /// Fully opaque.
    #[default]
    Opaque,
    /// Alpha testing against the given cutoff.
    Mask(f32),
    /// Full alpha blending.
    Blend,
}

/// The texture slots a [`Material`] can sample from.
///
/// Disposal releases every occupied slot, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// Base color (albedo) map.
    Map,
    /// Baked lighting or ambient occlusion.
    LightMap,
    /// Height-based bump map.
    BumpMap,
    /// Tangent-space normal map.
    NormalMap,
    /// Specular intensity map.
    SpecularMap,
    /// Environment reflection map.
    EnvMap,
}

impl TextureSlot {
    /// Every slot, in disposal order.
    pub const ALL: [TextureSlot; 6] = [
        TextureSlot::Map,
        TextureSlot::LightMap,
        TextureSlot::BumpMap,
        TextureSlot::NormalMap,
        TextureSlot::SpecularMap,
        TextureSlot::EnvMap,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TextureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextureSlot::Map => "map",
            TextureSlot::LightMap => "lightMap",
            TextureSlot::BumpMap => "bumpMap",
            TextureSlot::NormalMap => "normalMap",
            TextureSlot::SpecularMap => "specularMap",
            TextureSlot::EnvMap => "envMap",
        };
        f.write_str(name)
    }
}

/// A physically-based material using the metallic-roughness workflow.
///
/// Materials are the per-instance part of a scene: every clone gets its own
/// copy, so tinting one instance never tints another. Textures, on the other
/// hand, are shared between copies and only freed with their last user.
#[derive(Debug)]
pub struct Material {
    /// Debug name from the source asset.
    pub name: Option<String>,
    /// The base color (albedo).
    pub base_color: LinearRgba,
    /// The metallic factor (0.0 = dielectric, 1.0 = metal).
    pub metallic: f32,
    /// The roughness factor (0.0 = smooth, 1.0 = rough).
    pub roughness: f32,
    /// Emitted color, added after lighting.
    pub emissive: LinearRgba,
    /// Transparency handling.
    pub alpha_mode: AlphaMode,
    /// Whether back faces are rendered.
    pub double_sided: bool,
    textures: [Option<Shared<Texture>>; 6],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color: LinearRgba::WHITE,
            metallic: 0.0,
            roughness: 1.0,
            emissive: LinearRgba::BLACK,
            alpha_mode: AlphaMode::Opaque,
            double_sided: false,
            textures: Default::default(),
        }
    }
}

impl Material {
    /// Size in bytes of a material's uniform block on the GPU.
    pub const UNIFORM_BYTES: u64 = 64;

    /// A plain standard material of the given color.
    pub fn standard(base_color: LinearRgba) -> Self {
        Self {
            base_color,
            ..Default::default()
        }
    }

    /// The texture bound to `slot`, if any.
    pub fn texture(&self, slot: TextureSlot) -> Option<&Shared<Texture>> {
        self.textures[slot.index()].as_ref()
    }

    /// Binds `texture` to `slot`, returning what was bound before.
    pub fn set_texture(
        &mut self,
        slot: TextureSlot,
        texture: Option<Shared<Texture>>,
    ) -> Option<Shared<Texture>> {
        std::mem::replace(&mut self.textures[slot.index()], texture)
    }

    /// Iterates over occupied slots.
    pub fn textures(&self) -> impl Iterator<Item = (TextureSlot, &Shared<Texture>)> {
        TextureSlot::ALL
            .into_iter()
            .filter_map(|slot| self.texture(slot).map(|t| (slot, t)))
    }

    /// Empties every slot and hands the textures to the caller.
    pub fn take_textures(&mut self) -> Vec<(TextureSlot, Shared<Texture>)> {
        TextureSlot::ALL
            .into_iter()
            .filter_map(|slot| self.set_texture(slot, None).map(|t| (slot, t)))
            .collect()
    }

    /// Copies every parameter and takes a new reference to every texture.
    pub fn deep_copy(&self) -> Material {
        Material {
            name: self.name.clone(),
            base_color: self.base_color,
            metallic: self.metallic,
            roughness: self.roughness,
            emissive: self.emissive,
            alpha_mode: self.alpha_mode,
            double_sided: self.double_sided,
            textures: std::array::from_fn(|i| self.textures[i].as_ref().map(Shared::retain)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ResourceKind, TrackingDevice};
    use std::sync::Arc;

    #[test]
    fn test_deep_copy_shares_textures_but_not_parameters() {
        let device = Arc::new(TrackingDevice::new());
        let texture = Shared::new(
            device.clone(),
            ResourceKind::Texture,
            "albedo",
            4,
            Texture::solid([255; 4]),
        );
        let mut original = Material::standard(LinearRgba::WHITE);
        original.set_texture(TextureSlot::Map, Some(texture));

        let mut copy = original.deep_copy();
        copy.base_color = LinearRgba::BLACK;

        assert_eq!(original.base_color, LinearRgba::WHITE);
        let (a, b) = (
            original.texture(TextureSlot::Map).unwrap(),
            copy.texture(TextureSlot::Map).unwrap(),
        );
        assert!(Shared::ptr_eq(a, b));
        assert_eq!(a.ref_count(), 2);
    }

    #[test]
    fn test_take_textures_empties_all_slots() {
        let device = Arc::new(TrackingDevice::new());
        let mut material = Material::default();
        for slot in [TextureSlot::NormalMap, TextureSlot::EnvMap] {
            let t = Shared::new(device.clone(), ResourceKind::Texture, "t", 4, Texture::solid([0; 4]));
            material.set_texture(slot, Some(t));
        }
        let taken = material.take_textures();
        let slots: Vec<_> = taken.iter().map(|(s, _)| *s).collect();
        assert_eq!(slots, vec![TextureSlot::NormalMap, TextureSlot::EnvMap]);
        assert_eq!(material.textures().count(), 0);
        drop(taken);
        assert_eq!(device.stats().live_resources, 0);
    }
}
