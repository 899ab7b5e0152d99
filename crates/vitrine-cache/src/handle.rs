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

use crate::{cache::CacheShared, ReleaseError};
use std::{fmt, sync::Weak};
use vitrine_core::{AssetId, DisposeReport, SceneGraph};

/// Identifies one checkout within the cache that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckoutId(pub(crate) u64);

impl fmt::Display for CheckoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A consumer's private copy of a cached asset.
///
/// The handle owns its scene graph outright: edits through
/// [`root_mut`](Self::root_mut) are never seen by the cache or by other
/// handles. It is move-only and is given back with
/// [`ResourceCache::release`](crate::ResourceCache::release) or
/// [`CheckoutHandle::release`], which dispose the copy.
///
/// Dropping a handle without releasing it still disposes the copy and
/// retires the checkout, but logs a warning.
pub struct CheckoutHandle {
    pub(crate) checkout: CheckoutId,
    pub(crate) id: AssetId,
    pub(crate) graph: SceneGraph,
    pub(crate) cache: Weak<CacheShared>,
    pub(crate) cache_token: u64,
    pub(crate) settled: bool,
}

impl CheckoutHandle {
    /// The scene graph of this copy.
    pub fn root(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable access to this copy. Changes stay local to the handle.
    pub fn root_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// The identifier this handle was acquired with.
    pub fn identifier(&self) -> &AssetId {
        &self.id
    }

    /// The checkout this handle stands for.
    pub fn checkout_id(&self) -> CheckoutId {
        self.checkout
    }

    /// Releases the handle through the cache that issued it.
    ///
    /// If that cache no longer exists the copy is simply disposed.
    pub fn release(self) -> Result<DisposeReport, ReleaseError> {
        match self.cache.upgrade() {
            Some(shared) => shared.release(self),
            None => Ok(self.settle()),
        }
    }

    /// Marks the handle as handled and disposes its copy.
    pub(crate) fn settle(mut self) -> DisposeReport {
        self.settled = true;
        self.graph.dispose()
    }
}

impl Drop for CheckoutHandle {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        log::warn!(
            "Checkout {} of '{}' dropped without release; disposing it",
            self.checkout,
            self.id
        );
        if let Some(shared) = self.cache.upgrade() {
            shared.retire(self.cache_token, self.checkout);
        }
        self.graph.dispose();
    }
}

impl fmt::Debug for CheckoutHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutHandle")
            .field("checkout", &self.checkout)
            .field("id", &self.id)
            .field("nodes", &self.graph.len())
            .finish()
    }
}
