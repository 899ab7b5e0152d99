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

//! Provides the small set of math primitives the scene graph needs.
//!
//! Scene nodes only carry TRS transforms, vertex attributes and material
//! colors, so this module stays deliberately narrow: vectors, a rotation
//! quaternion, a linear color and an axis-aligned bounding box.

// --- Fundamental Constants ---

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

// --- Declare Sub-Modules ---

pub mod color;
pub mod geometry;
pub mod quaternion;
pub mod transform;
pub mod vector;

// --- Re-export Principal Types ---

pub use self::color::LinearRgba;
pub use self::geometry::Aabb;
pub use self::quaternion::Quaternion;
pub use self::transform::Transform;
pub use self::vector::{Vec2, Vec3};
