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

use super::{DisposeReport, Material, NodeId, NodeKind, SceneNode};
use crate::{
    math::LinearRgba,
    resource::{ResourceId, ResourceKind, ResourceWatch, Shared},
};
use std::{
    collections::{HashMap, HashSet},
    fmt,
};

/// Errors raised when editing a [`SceneGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The id does not belong to this graph.
    UnknownNode(NodeId),
    /// Linking `child` under `parent` would create a cycle.
    WouldCycle {
        /// The requested parent.
        parent: NodeId,
        /// The requested child.
        child: NodeId,
    },
    /// The graph was disposed and can no longer be edited.
    Disposed,
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::UnknownNode(id) => write!(f, "Unknown scene node {id}"),
            SceneError::WouldCycle { parent, child } => {
                write!(f, "Attaching {child} under {parent} would create a cycle")
            }
            SceneError::Disposed => write!(f, "Scene graph has been disposed"),
        }
    }
}

impl std::error::Error for SceneError {}

/// A decoded 3D scene: an arena of nodes plus the list of root nodes.
///
/// A node may be listed as the child of several parents (instancing), so the
/// structure is a DAG rather than a strict tree. Traversal and disposal visit
/// every node once regardless.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
    disposed: bool,
}

impl SceneGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` once [`SceneGraph::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The top-level nodes, in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Looks up a node.
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    /// Looks up a node for editing.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.index())
    }

    /// Iterates over every node in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    fn push(&mut self, node: SceneNode) -> Result<NodeId, SceneError> {
        if self.disposed {
            return Err(SceneError::Disposed);
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        Ok(id)
    }

    fn check(&self, id: NodeId) -> Result<(), SceneError> {
        if self.disposed {
            Err(SceneError::Disposed)
        } else if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(id))
        }
    }

    /// Adds a top-level node.
    pub fn add_root(&mut self, node: SceneNode) -> Result<NodeId, SceneError> {
        let id = self.push(node)?;
        self.roots.push(id);
        Ok(id)
    }

    /// Adds a node that is neither a root nor anyone's child yet.
    ///
    /// Decoders use this to build a node before linking it with
    /// [`SceneGraph::attach`] or [`SceneGraph::make_root`].
    pub fn add_detached(&mut self, node: SceneNode) -> Result<NodeId, SceneError> {
        self.push(node)
    }

    /// Lists an existing node as a root. Listing it twice has no effect.
    pub fn make_root(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.check(id)?;
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
        Ok(())
    }

    /// Adds `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> Result<NodeId, SceneError> {
        self.check(parent)?;
        let id = self.push(node)?;
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    /// Links an existing node under an additional parent.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check(parent)?;
        self.check(child)?;
        if self.is_reachable(child, parent) {
            return Err(SceneError::WouldCycle { parent, child });
        }
        self.nodes[parent.index()].children.push(child);
        Ok(())
    }

    /// Unlinks `child` from `parent`. Returns whether a link was removed.
    ///
    /// The child stays in the arena and keeps its resources until the graph
    /// is disposed.
    pub fn detach(&mut self, parent: NodeId, child: NodeId) -> Result<bool, SceneError> {
        self.check(parent)?;
        self.check(child)?;
        let children = &mut self.nodes[parent.index()].children;
        let before = children.len();
        children.retain(|c| *c != child);
        Ok(children.len() != before)
    }

    fn is_reachable(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if std::mem::replace(&mut visited[id.index()], true) {
                continue;
            }
            stack.extend_from_slice(&self.nodes[id.index()].children);
        }
        false
    }

    /// Depth-first, pre-order walk from the roots. Each node appears once.
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut visited[id.index()], true) {
                continue;
            }
            order.push(id);
            stack.extend(self.nodes[id.index()].children.iter().rev().copied());
        }
        order
    }

    /// Finds the first node named `name` in traversal order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse()
            .into_iter()
            .find(|id| self.nodes[id.index()].name.as_deref() == Some(name))
    }

    /// Number of `Mesh` nodes.
    pub fn mesh_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Mesh { .. }))
            .count()
    }

    /// Produces an independent instance of this scene.
    ///
    /// The hierarchy, names and transforms are copied. Geometry is shared
    /// (one more reference each). Materials are duplicated into new device
    /// resources, keeping their textures shared. A material used by several
    /// nodes of `self` stays shared between the same nodes of the copy.
    pub fn deep_clone(&self) -> SceneGraph {
        let mut materials: HashMap<ResourceId, Shared<Material>> = HashMap::new();
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                let kind = match &node.kind {
                    NodeKind::Group => NodeKind::Group,
                    NodeKind::Geometry { geometry } => NodeKind::Geometry {
                        geometry: geometry.retain(),
                    },
                    NodeKind::Mesh { geometry, material } => NodeKind::Mesh {
                        geometry: geometry.retain(),
                        material: materials
                            .entry(material.id())
                            .or_insert_with(|| material.duplicate_with(Material::deep_copy))
                            .retain(),
                    },
                };
                SceneNode {
                    name: node.name.clone(),
                    transform: node.transform,
                    visible: node.visible,
                    kind,
                    children: node.children.clone(),
                }
            })
            .collect();

        SceneGraph {
            nodes,
            roots: self.roots.clone(),
            disposed: self.disposed,
        }
    }

    /// Gives every material-less geometry node a standard material of `color`.
    ///
    /// Returns the number of nodes that were upgraded to meshes.
    pub fn apply_default_materials(&mut self, color: LinearRgba) -> usize {
        let mut applied = 0;
        for node in &mut self.nodes {
            node.kind = match std::mem::take(&mut node.kind) {
                NodeKind::Geometry { geometry } => {
                    let material = geometry.sibling(
                        ResourceKind::Material,
                        "default",
                        Material::UNIFORM_BYTES,
                        Material::standard(color),
                    );
                    applied += 1;
                    NodeKind::Mesh { geometry, material }
                }
                other => other,
            };
        }
        applied
    }

    /// Watches on every distinct resource referenced by the graph.
    pub fn resource_watches(&self) -> Vec<(ResourceKind, ResourceWatch)> {
        fn track<T>(
            seen: &mut HashSet<ResourceId>,
            out: &mut Vec<(ResourceKind, ResourceWatch)>,
            resource: &Shared<T>,
        ) {
            if seen.insert(resource.id()) {
                out.push((resource.kind(), resource.watch()));
            }
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for node in &self.nodes {
            match &node.kind {
                NodeKind::Group => {}
                NodeKind::Geometry { geometry } => track(&mut seen, &mut out, geometry),
                NodeKind::Mesh { geometry, material } => {
                    track(&mut seen, &mut out, geometry);
                    track(&mut seen, &mut out, material);
                    for (_, texture) in material.textures() {
                        track(&mut seen, &mut out, texture);
                    }
                }
            }
        }
        out
    }

    /// Releases every resource reference held by this graph.
    ///
    /// Nodes are walked depth-first from the roots, each one at most once,
    /// then nodes no longer reachable from any root are swept. Materials owned
    /// solely by this graph release their texture slots first; a material
    /// still referenced elsewhere only loses this graph's reference.
    ///
    /// Calling `dispose` again is a no-op that returns an empty report.
    pub fn dispose(&mut self) -> DisposeReport {
        let mut report = DisposeReport::default();
        if self.disposed {
            return report;
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut visited[id.index()], true) {
                continue;
            }
            let node = &mut self.nodes[id.index()];
            stack.extend(node.children.iter().rev().copied());
            release_node(node, &mut report);
        }

        // detached nodes
        for (node, seen) in self.nodes.iter_mut().zip(visited) {
            if !seen {
                release_node(node, &mut report);
            }
        }

        self.nodes.clear();
        self.roots.clear();
        self.disposed = true;
        log::trace!(
            "Disposed scene graph: {} nodes, {} references released, {} resources freed",
            report.nodes,
            report.released,
            report.freed
        );
        report
    }
}

fn release_node(node: &mut SceneNode, report: &mut DisposeReport) {
    match std::mem::take(&mut node.kind) {
        NodeKind::Group => {}
        NodeKind::Geometry { geometry } => report.release(geometry),
        NodeKind::Mesh {
            geometry,
            mut material,
        } => {
            report.release(geometry);
            if let Some(owned) = material.get_mut() {
                for (_, texture) in owned.take_textures() {
                    report.release(texture);
                }
            }
            report.release(material);
        }
    }
    report.nodes += 1;
}
