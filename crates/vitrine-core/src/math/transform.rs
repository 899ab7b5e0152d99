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

//! Local translation/rotation/scale transforms of scene nodes.

use super::{Quaternion, Vec3};
use serde::{Deserialize, Serialize};

/// A local TRS transform, relative to the parent node.
///
/// This is plain `Copy` data: cloning a scene graph copies every node's
/// transform, so moving one instance never moves another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation relative to the parent.
    pub translation: Vec3,
    /// Rotation relative to the parent.
    pub rotation: Quaternion,
    /// Non-uniform scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quaternion::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates a transform with only a translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Applies this transform to a point.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.rotate_vec3(point * self.scale) + self.translation
    }

    /// Composes `self` (parent) with `child`, yielding the child's transform in
    /// the parent's space.
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.transform_point(child.translation),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_composition() {
        let parent = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let child = Transform::from_translation(Vec3::new(0.0, 2.0, 0.0));
        let world = parent.mul_transform(&child);
        assert_eq!(world.translation, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_scale_applies_before_translation() {
        let t = Transform {
            scale: Vec3::new(2.0, 2.0, 2.0),
            ..Transform::from_translation(Vec3::new(0.0, 0.0, 1.0))
        };
        assert_eq!(
            t.transform_point(Vec3::new(1.0, 0.0, 0.0)),
            Vec3::new(2.0, 0.0, 1.0)
        );
    }
}
