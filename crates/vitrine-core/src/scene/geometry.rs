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

use crate::math::{Aabb, Vec2, Vec3};

/// CPU-side copy of a geometry buffer: vertex attributes and optional indices.
///
/// Geometry is never mutated once it is part of a scene graph, which is what
/// allows every clone of a scene to share the same GPU buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Vertex normals, one per position when present.
    pub normals: Option<Vec<Vec3>>,
    /// Texture coordinates, one per position when present.
    pub uvs: Option<Vec<Vec2>>,
    /// Triangle list indices. `None` means non-indexed drawing.
    pub indices: Option<Vec<u32>>,
    /// Bounds of `positions`, `None` for empty geometry.
    pub bounds: Option<Aabb>,
}

impl Geometry {
    /// Creates a geometry from positions and computes its bounds.
    pub fn new(positions: Vec<Vec3>) -> Self {
        let bounds = Aabb::from_points(&positions);
        Self {
            positions,
            bounds,
            ..Default::default()
        }
    }

    /// Attaches per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Attaches per-vertex texture coordinates.
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Attaches a triangle index list.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles, indexed or not.
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Size in bytes of the GPU buffers backing this geometry.
    pub fn byte_size(&self) -> u64 {
        let vec3 = std::mem::size_of::<Vec3>() as u64;
        let vec2 = std::mem::size_of::<Vec2>() as u64;
        let positions = self.positions.len() as u64 * vec3;
        let normals = self.normals.as_ref().map_or(0, |n| n.len() as u64 * vec3);
        let uvs = self.uvs.as_ref().map_or(0, |u| u.len() as u64 * vec2);
        let indices = self.indices.as_ref().map_or(0, |i| i.len() as u64 * 4);
        positions + normals + uvs + indices
    }

    /// A unit triangle in the XY plane. Used by tests and placeholders.
    pub fn triangle() -> Self {
        Self::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ])
        .with_indices(vec![0, 1, 2])
    }
}
