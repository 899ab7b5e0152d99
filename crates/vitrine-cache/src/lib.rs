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

//! # Vitrine Cache
//!
//! The resource cache sitting between scene consumers and asset loaders.
//!
//! A [`ResourceCache`] keeps one canonical decoded scene per asset
//! identifier, makes sure concurrent requests for the same asset trigger a
//! single load, and gives each consumer a [`CheckoutHandle`] around a private
//! deep clone. Releasing a handle disposes only that clone; canonical
//! instances leave the cache through explicit eviction.

#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod handle;
mod metrics;
mod pending;

pub use cache::{AssetState, ResourceCache};
pub use config::CacheConfig;
pub use error::{ConfigError, LoadError, ReleaseError};
pub use handle::{CheckoutHandle, CheckoutId};
pub use metrics::METRICS_NAMESPACE;
