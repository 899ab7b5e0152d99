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

//! # Vitrine Core
//!
//! Foundational crate containing the contracts and primitive types shared by
//! every other Vitrine crate: math primitives, asset identifiers and loader
//! traits, GPU resource accounting, and the scene graph handed out by the
//! asset cache.

#![warn(missing_docs)]

pub mod asset;
pub mod math;
pub mod resource;
pub mod scene;

pub use asset::{AssetId, AssetLoader, DecodeError, LoadProgress, ProgressObserver};
pub use resource::{ResourceDevice, ResourceId, ResourceKind, Shared, TrackingDevice};
pub use scene::{DisposeReport, Material, NodeId, NodeKind, SceneGraph, SceneNode};
