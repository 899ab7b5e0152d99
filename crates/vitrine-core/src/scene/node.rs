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

use super::{Geometry, Material};
use crate::{math::Transform, resource::Shared};
use std::fmt;

/// Index of a node inside its [`SceneGraph`](super::SceneGraph) arena.
///
/// Clones of a graph keep the same ids, so a `NodeId` found on one instance
/// addresses the corresponding node on every other instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// What a node carries besides its transform.
#[derive(Debug, Default)]
pub enum NodeKind {
    /// A transform-only group.
    #[default]
    Group,
    /// Geometry that has no material yet.
    Geometry {
        /// The shared vertex data.
        geometry: Shared<Geometry>,
    },
    /// Renderable geometry paired with its material.
    Mesh {
        /// The shared vertex data.
        geometry: Shared<Geometry>,
        /// The material, owned by this scene instance.
        material: Shared<Material>,
    },
}

impl NodeKind {
    /// A short tag for logs.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Geometry { .. } => "geometry",
            NodeKind::Mesh { .. } => "mesh",
        }
    }
}

/// One node of a scene graph.
#[derive(Debug)]
pub struct SceneNode {
    /// Name from the source asset, used for lookups.
    pub name: Option<String>,
    /// Local transform relative to the parent.
    pub transform: Transform,
    /// Hidden nodes are skipped by renderers but still owned and disposed.
    pub visible: bool,
    /// Payload.
    pub kind: NodeKind,
    pub(crate) children: Vec<NodeId>,
}

impl SceneNode {
    /// Creates a node with an identity transform.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            transform: Transform::IDENTITY,
            visible: true,
            kind,
            children: Vec::new(),
        }
    }

    /// A transform-only group.
    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the local transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Ids of the direct children.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The geometry of a `Geometry` or `Mesh` node.
    pub fn geometry(&self) -> Option<&Shared<Geometry>> {
        match &self.kind {
            NodeKind::Group => None,
            NodeKind::Geometry { geometry } | NodeKind::Mesh { geometry, .. } => Some(geometry),
        }
    }

    /// The material of a `Mesh` node.
    pub fn material(&self) -> Option<&Material> {
        match &self.kind {
            NodeKind::Mesh { material, .. } => Some(&**material),
            _ => None,
        }
    }

    /// Mutable access to the material of a `Mesh` node.
    ///
    /// A material shared with other nodes is copied first, so the edit only
    /// affects this node.
    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.kind {
            NodeKind::Mesh { material, .. } => Some(material.make_mut_with(Material::deep_copy)),
            _ => None,
        }
    }
}
