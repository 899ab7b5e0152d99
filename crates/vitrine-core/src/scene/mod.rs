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

//! The in-memory scene graph produced by asset decoders.
//!
//! A [`SceneGraph`] is an arena of [`SceneNode`]s. Each node is tagged with a
//! [`NodeKind`]: a bare transform group, a node carrying geometry only, or a
//! mesh pairing geometry with a [`Material`]. GPU-resident data (geometry
//! buffers, materials, textures) is held through [`Shared`](crate::resource::Shared)
//! references so that clones can share what is immutable and own what is not.

mod dispose;
mod geometry;
mod graph;
mod material;
mod node;
mod texture;

pub use dispose::*;
pub use geometry::*;
pub use graph::*;
pub use material::*;
pub use node::*;
pub use texture::*;
