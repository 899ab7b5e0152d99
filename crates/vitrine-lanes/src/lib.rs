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

//! # Vitrine Lanes
//!
//! Concrete loading paths for the asset cache. A lane pairs an
//! [`AssetSource`](asset_lane::AssetSource), which fetches bytes and reports
//! progress, with a [`SceneDecoder`](asset_lane::SceneDecoder), which turns
//! those bytes into a [`SceneGraph`](vitrine_core::SceneGraph).

#![warn(missing_docs)]

pub mod asset_lane;

pub use asset_lane::*;
