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

//! glTF 2.0 scene decoder with support for both embedded and external resources.

use super::{decode_data_uri, decode_texture, GltfResourceResolver};
use crate::asset_lane::SceneDecoder;
use ahash::AHashMap;
use anyhow::{anyhow, bail, Context, Result};
use gltf::{mesh::Reader, Buffer};
use std::sync::Arc;
use vitrine_core::{
    math::{Aabb, LinearRgba, Quaternion, Transform, Vec2, Vec3},
    resource::{ResourceDevice, ResourceKind, Shared},
    scene::{AlphaMode, Geometry, Material, NodeId, NodeKind, SceneNode, Texture, TextureFormat, TextureSlot},
    AssetId, DecodeError, SceneGraph,
};

/// Decodes `.gltf` (JSON) and `.glb` (binary) files into scene graphs.
///
/// The whole default scene is decoded: the node hierarchy with TRS
/// transforms, every triangle primitive as geometry, and PBR materials with
/// their textures. Geometry, materials and textures referenced several times
/// are created once and shared inside the resulting graph.
#[derive(Clone, Default)]
pub struct GltfSceneDecoder {
    resolver: Option<Arc<dyn GltfResourceResolver>>,
}

impl GltfSceneDecoder {
    /// A decoder for self-contained files (GLB or data URIs only).
    pub fn new() -> Self {
        Self::default()
    }

    /// A decoder that loads external buffers and images through `resolver`.
    pub fn with_resolver(resolver: Arc<dyn GltfResourceResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }
}

impl SceneDecoder for GltfSceneDecoder {
    fn decode(
        &self,
        id: &AssetId,
        bytes: &[u8],
        device: &Arc<dyn ResourceDevice>,
    ) -> Result<SceneGraph, DecodeError> {
        let gltf = gltf::Gltf::from_slice(bytes)
            .map_err(|e| DecodeError::malformed(id, format!("Failed to parse glTF file: {e}")))?;
        let buffers = self
            .load_buffer_data(id, &gltf)
            .map_err(|e| DecodeError::malformed(id, format!("{e:#}")))?;

        let mut builder = SceneBuilder {
            id,
            document: &gltf.document,
            buffers: &buffers,
            resolver: self.resolver.as_deref(),
            device,
            graph: SceneGraph::new(),
            nodes: AHashMap::new(),
            geometries: AHashMap::new(),
            materials: AHashMap::new(),
            textures: AHashMap::new(),
        };
        builder
            .build()
            .map_err(|e| DecodeError::malformed(id, format!("{e:#}")))?;

        let graph = builder.graph;
        log::debug!(
            "Decoded glTF '{id}': {} nodes, {} meshes",
            graph.len(),
            graph.mesh_count()
        );
        Ok(graph)
    }

    fn supports(&self, id: &AssetId) -> bool {
        matches!(id.extension().as_deref(), None | Some("gltf" | "glb"))
    }
}

impl GltfSceneDecoder {
    fn load_buffer_data(&self, id: &AssetId, gltf: &gltf::Gltf) -> Result<Vec<Vec<u8>>> {
        let mut buffer_data = Vec::new();
        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => gltf
                    .blob
                    .clone()
                    .context("GLB file references binary chunk but it is missing")?,
                gltf::buffer::Source::Uri(uri) => match decode_data_uri(uri)? {
                    Some((_, data)) => data,
                    None => resolve(self.resolver.as_deref(), uri, |r| {
                        r.resolve_buffer(id, uri)
                    })?,
                },
            };
            if data.len() < buffer.length() {
                bail!(
                    "Buffer {} holds {} bytes, {} declared",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                );
            }
            buffer_data.push(data);
        }
        Ok(buffer_data)
    }
}

fn resolve(
    resolver: Option<&dyn GltfResourceResolver>,
    uri: &str,
    fetch: impl FnOnce(&dyn GltfResourceResolver) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>,
) -> Result<Vec<u8>> {
    let resolver =
        resolver.ok_or_else(|| anyhow!("External resource '{uri}' but no resolver configured"))?;
    fetch(resolver).map_err(|e| anyhow!(e))
}

/// Per-decode state: the graph under construction and the resources already
/// created, keyed by their glTF indices.
struct SceneBuilder<'a> {
    id: &'a AssetId,
    document: &'a gltf::Document,
    buffers: &'a [Vec<u8>],
    resolver: Option<&'a dyn GltfResourceResolver>,
    device: &'a Arc<dyn ResourceDevice>,
    graph: SceneGraph,
    nodes: AHashMap<usize, NodeId>,
    geometries: AHashMap<(usize, usize), Shared<Geometry>>,
    materials: AHashMap<usize, Shared<Material>>,
    textures: AHashMap<(usize, bool), Shared<Texture>>,
}

impl SceneBuilder<'_> {
    fn build(&mut self) -> Result<()> {
        let document = self.document;
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .context("glTF file contains no scene")?;

        for node in scene.nodes() {
            let id = self.add_node(&node)?;
            self.graph.make_root(id)?;
        }
        Ok(())
    }

    /// Adds `node` and its subtree, returning its id. A node reached twice is
    /// linked, not duplicated.
    fn add_node(&mut self, node: &gltf::Node<'_>) -> Result<NodeId> {
        if let Some(id) = self.nodes.get(&node.index()) {
            return Ok(*id);
        }

        let (translation, rotation, scale) = node.transform().decomposed();
        let transform = Transform {
            translation: Vec3::from_array(translation),
            rotation: Quaternion::from_array(rotation),
            scale: Vec3::from_array(scale),
        };
        let name = node
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("node{}", node.index()));

        let mut kinds = match node.mesh() {
            Some(mesh) => self.primitives(&mesh)?,
            None => Vec::new(),
        };
        // a single primitive lives on the node itself
        let own_kind = if kinds.len() == 1 {
            kinds.pop().unwrap_or_default()
        } else {
            NodeKind::Group
        };

        let id = self.graph.add_detached(
            SceneNode::new(own_kind)
                .with_name(name.clone())
                .with_transform(transform),
        )?;
        self.nodes.insert(node.index(), id);

        for (i, kind) in kinds.into_iter().enumerate() {
            self.graph
                .add_child(id, SceneNode::new(kind).with_name(format!("{name}#{i}")))?;
        }
        for child in node.children() {
            let child_id = self.add_node(&child)?;
            self.graph.attach(id, child_id)?;
        }
        Ok(id)
    }

    fn primitives(&mut self, mesh: &gltf::Mesh<'_>) -> Result<Vec<NodeKind>> {
        let mut kinds = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "'{}': skipping {:?} primitive {} of mesh {}",
                    self.id,
                    primitive.mode(),
                    primitive.index(),
                    mesh.index()
                );
                continue;
            }
            let geometry = self.geometry(mesh, &primitive)?;
            let material = primitive.material();
            let kind = match material.index() {
                Some(_) => NodeKind::Mesh {
                    geometry,
                    material: self.material(&material)?,
                },
                None => NodeKind::Geometry { geometry },
            };
            kinds.push(kind);
        }
        Ok(kinds)
    }

    fn geometry(
        &mut self,
        mesh: &gltf::Mesh<'_>,
        primitive: &gltf::Primitive<'_>,
    ) -> Result<Shared<Geometry>> {
        let key = (mesh.index(), primitive.index());
        if let Some(geometry) = self.geometries.get(&key) {
            return Ok(geometry.retain());
        }

        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        let positions = extract_positions(&reader)?;
        let bounds = primitive.bounding_box();
        let geometry = Geometry {
            positions,
            normals: extract_normals(&reader),
            uvs: extract_tex_coords(&reader),
            indices: extract_indices(&reader),
            bounds: Some(Aabb::from_min_max(
                Vec3::from_array(bounds.min),
                Vec3::from_array(bounds.max),
            )),
        };

        let label = format!(
            "{}#{}",
            mesh.name().unwrap_or("mesh"),
            primitive.index()
        );
        let shared = Shared::new(
            Arc::clone(self.device),
            ResourceKind::Geometry,
            label,
            geometry.byte_size(),
            geometry,
        );
        let handle = shared.retain();
        self.geometries.insert(key, shared);
        Ok(handle)
    }

    fn material(&mut self, material: &gltf::Material<'_>) -> Result<Shared<Material>> {
        let index = material
            .index()
            .context("default material has no index")?;
        if let Some(existing) = self.materials.get(&index) {
            return Ok(existing.retain());
        }

        let pbr = material.pbr_metallic_roughness();
        let [er, eg, eb] = material.emissive_factor();
        let mut decoded = Material::standard(LinearRgba::from_array(pbr.base_color_factor()));
        decoded.name = material.name().map(str::to_owned);
        decoded.metallic = pbr.metallic_factor();
        decoded.roughness = pbr.roughness_factor();
        decoded.emissive = LinearRgba::rgb(er, eg, eb);
        decoded.alpha_mode = match material.alpha_mode() {
            gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
            gltf::material::AlphaMode::Mask => AlphaMode::Mask(material.alpha_cutoff().unwrap_or(0.5)),
            gltf::material::AlphaMode::Blend => AlphaMode::Blend,
        };
        decoded.double_sided = material.double_sided();

        if let Some(info) = pbr.base_color_texture() {
            let texture = self.texture(&info.texture(), false)?;
            decoded.set_texture(TextureSlot::Map, Some(texture));
        }
        if let Some(normal) = material.normal_texture() {
            let texture = self.texture(&normal.texture(), true)?;
            decoded.set_texture(TextureSlot::NormalMap, Some(texture));
        }
        if let Some(occlusion) = material.occlusion_texture() {
            let texture = self.texture(&occlusion.texture(), true)?;
            decoded.set_texture(TextureSlot::LightMap, Some(texture));
        }

        let label = material
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("material{index}"));
        let shared = Shared::new(
            Arc::clone(self.device),
            ResourceKind::Material,
            label,
            Material::UNIFORM_BYTES,
            decoded,
        );
        let handle = shared.retain();
        self.materials.insert(index, shared);
        Ok(handle)
    }

    fn texture(&mut self, texture: &gltf::Texture<'_>, linear: bool) -> Result<Shared<Texture>> {
        let image = texture.source();
        let key = (image.index(), linear);
        if let Some(existing) = self.textures.get(&key) {
            return Ok(existing.retain());
        }

        let (encoded, name) = match image.source() {
            gltf::image::Source::View { view, .. } => {
                let buffer = self
                    .buffers
                    .get(view.buffer().index())
                    .context("image view references a missing buffer")?;
                let bytes = buffer
                    .get(view.offset()..view.offset() + view.length())
                    .context("image view out of buffer bounds")?;
                (bytes.to_vec(), format!("image{}", image.index()))
            }
            gltf::image::Source::Uri { uri, .. } => {
                let bytes = match decode_data_uri(uri)? {
                    Some((_, data)) => data,
                    None => resolve(self.resolver, uri, |r| r.resolve_image(self.id, uri))?,
                };
                let name = if uri.starts_with("data:") {
                    format!("image{}", image.index())
                } else {
                    uri.to_owned()
                };
                (bytes, name)
            }
        };

        let format = if linear {
            TextureFormat::Rgba8Unorm
        } else {
            TextureFormat::Rgba8UnormSrgb
        };
        let decoded = decode_texture(&encoded, format)
            .with_context(|| format!("Failed to decode texture '{name}'"))?
            .with_name(name.clone());
        let shared = Shared::new(
            Arc::clone(self.device),
            ResourceKind::Texture,
            name,
            decoded.byte_size(),
            decoded,
        );
        let handle = shared.retain();
        self.textures.insert(key, shared);
        Ok(handle)
    }
}

fn extract_positions<'a, 's, F>(reader: &Reader<'a, 's, F>) -> Result<Vec<Vec3>>
where
    F: Clone + Fn(Buffer<'a>) -> Option<&'s [u8]>,
{
    reader
        .read_positions()
        .map(|iter| iter.map(Vec3::from_array).collect())
        .context("Vertex positions attribute not found")
}

fn extract_normals<'a, 's, F>(reader: &Reader<'a, 's, F>) -> Option<Vec<Vec3>>
where
    F: Clone + Fn(Buffer<'a>) -> Option<&'s [u8]>,
{
    reader
        .read_normals()
        .map(|iter| iter.map(Vec3::from_array).collect())
}

fn extract_tex_coords<'a, 's, F>(reader: &Reader<'a, 's, F>) -> Option<Vec<Vec2>>
where
    F: Clone + Fn(Buffer<'a>) -> Option<&'s [u8]>,
{
    reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().map(|[x, y]| Vec2::new(x, y)).collect())
}

fn extract_indices<'a, 's, F>(reader: &Reader<'a, 's, F>) -> Option<Vec<u32>>
where
    F: Clone + Fn(Buffer<'a>) -> Option<&'s [u8]>,
{
    reader.read_indices().map(|iter| iter.into_u32().collect())
}
