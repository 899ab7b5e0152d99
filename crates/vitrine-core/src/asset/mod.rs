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

//! Provides the foundational contracts for loading 3D assets.
//!
//! This module defines the "common language" between the asset cache and the
//! collaborators that feed it. It has no knowledge of how bytes are fetched or
//! parsed:
//! - [`AssetId`]: the opaque identifier (URL or path) naming a loadable asset.
//! - [`LoadProgress`] and [`ProgressObserver`]: byte-level progress reporting.
//! - [`AssetLoader`]: the asynchronous contract turning an identifier into a
//!   decoded [`SceneGraph`](crate::scene::SceneGraph).
//! - [`DecodeError`]: everything that can go wrong on the way.

mod error;
mod id;
mod loader;
mod progress;

pub use error::*;
pub use id::*;
pub use loader::*;
pub use progress::*;
