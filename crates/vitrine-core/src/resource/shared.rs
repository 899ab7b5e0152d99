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

use super::{ResourceDevice, ResourceId, ResourceKind};
use std::{
    fmt,
    ops::Deref,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

/// Book-keeping shared by every owner of a resource and by its watches.
struct ResourceState {
    id: ResourceId,
    kind: ResourceKind,
    label: String,
    bytes: u64,
    refs: AtomicUsize,
    disposed: AtomicBool,
    device: Arc<dyn ResourceDevice>,
}

impl ResourceState {
    fn release(&self) {
        let previous = self.refs.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "resource {} released below zero", self.id);
        if previous == 1 {
            self.disposed.store(true, Ordering::Release);
            log::trace!("Freeing {} '{}' ({})", self.kind, self.label, self.id);
            self.device.free(self.id);
        }
    }
}

struct SharedInner<T> {
    value: T,
    state: Arc<ResourceState>,
}

/// An explicitly reference-counted, GPU-resident resource.
///
/// Every `Shared` value *is* one reference. [`Shared::retain`] produces a new
/// reference and bumps the counter, dropping a `Shared` decrements it, and the
/// device frees the resource when the counter reaches zero. Because `Shared`
/// is neither `Clone` nor `Copy`, each reference is released exactly once.
///
/// ```
/// use std::sync::Arc;
/// use vitrine_core::resource::{ResourceKind, Shared, TrackingDevice};
///
/// let device = Arc::new(TrackingDevice::new());
/// let a = Shared::new(device.clone(), ResourceKind::Texture, "albedo", 64, ());
/// let b = a.retain();
/// assert_eq!(a.ref_count(), 2);
/// drop(a);
/// assert!(!b.is_disposed());
/// let watch = b.watch();
/// drop(b);
/// assert!(watch.is_disposed());
/// assert_eq!(device.stats().live_resources, 0);
/// ```
pub struct Shared<T> {
    inner: Arc<SharedInner<T>>,
}

impl<T> Shared<T> {
    /// Allocates a resource on `device` and wraps `value` as its first reference.
    pub fn new(
        device: Arc<dyn ResourceDevice>,
        kind: ResourceKind,
        label: impl Into<String>,
        bytes: u64,
        value: T,
    ) -> Self {
        let label = label.into();
        let id = device.allocate(kind, &label, bytes);
        Self {
            inner: Arc::new(SharedInner {
                value,
                state: Arc::new(ResourceState {
                    id,
                    kind,
                    label,
                    bytes,
                    refs: AtomicUsize::new(1),
                    disposed: AtomicBool::new(false),
                    device,
                }),
            }),
        }
    }

    /// Takes an additional reference to the same resource.
    pub fn retain(&self) -> Self {
        self.inner.state.refs.fetch_add(1, Ordering::AcqRel);
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Allocates a *new* resource on the same device, of the same kind and
    /// size, holding the value produced by `copy`.
    ///
    /// The result shares nothing with `self` besides the device.
    pub fn duplicate_with(&self, copy: impl FnOnce(&T) -> T) -> Self {
        let state = &self.inner.state;
        Self::new(
            Arc::clone(&state.device),
            state.kind,
            state.label.clone(),
            state.bytes,
            copy(&self.inner.value),
        )
    }

    /// Allocates an unrelated resource on the device that owns `self`.
    pub fn sibling<U>(
        &self,
        kind: ResourceKind,
        label: impl Into<String>,
        bytes: u64,
        value: U,
    ) -> Shared<U> {
        Shared::new(Arc::clone(&self.inner.state.device), kind, label, bytes, value)
    }

    /// Mutable access, only granted while this is the sole reference.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        Arc::get_mut(&mut self.inner).map(|inner| &mut inner.value)
    }

    /// Copy-on-write access: when other references exist, `self` is first
    /// replaced by a private duplicate made with `copy`.
    pub fn make_mut_with(&mut self, copy: impl FnOnce(&T) -> T) -> &mut T {
        if Arc::get_mut(&mut self.inner).is_none() {
            *self = self.duplicate_with(copy);
        }
        Arc::get_mut(&mut self.inner)
            .map(|inner| &mut inner.value)
            .unwrap_or_else(|| unreachable!("a fresh duplicate has a single owner"))
    }

    /// The device-side identifier of this resource.
    pub fn id(&self) -> ResourceId {
        self.inner.state.id
    }

    /// The category of this resource.
    pub fn kind(&self) -> ResourceKind {
        self.inner.state.kind
    }

    /// The debug label given at allocation.
    pub fn label(&self) -> &str {
        &self.inner.state.label
    }

    /// The size reported to the device at allocation.
    pub fn bytes(&self) -> u64 {
        self.inner.state.bytes
    }

    /// Number of live references, including this one.
    pub fn ref_count(&self) -> usize {
        self.inner.state.refs.load(Ordering::Acquire)
    }

    /// Always `false` while a reference exists; see [`ResourceWatch`].
    pub fn is_disposed(&self) -> bool {
        self.inner.state.disposed.load(Ordering::Acquire)
    }

    /// Returns an observer that outlives every reference.
    pub fn watch(&self) -> ResourceWatch {
        ResourceWatch {
            state: Arc::clone(&self.inner.state),
        }
    }

    /// Returns `true` if both values reference the same resource.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner.value
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        self.inner.state.release();
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("refs", &self.ref_count())
            .field("value", &self.inner.value)
            .finish()
    }
}

/// A non-owning view of a resource's reference count and disposal state.
#[derive(Clone)]
pub struct ResourceWatch {
    state: Arc<ResourceState>,
}

impl ResourceWatch {
    /// The device-side identifier of the observed resource.
    pub fn id(&self) -> ResourceId {
        self.state.id
    }

    /// Number of live references.
    pub fn ref_count(&self) -> usize {
        self.state.refs.load(Ordering::Acquire)
    }

    /// `true` once the last reference was dropped and the device freed it.
    pub fn is_disposed(&self) -> bool {
        self.state.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ResourceWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceWatch")
            .field("id", &self.state.id)
            .field("refs", &self.ref_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::TrackingDevice;

    fn device() -> Arc<TrackingDevice> {
        Arc::new(TrackingDevice::new())
    }

    #[test]
    fn test_last_reference_frees() {
        let device = device();
        let a = Shared::new(device.clone(), ResourceKind::Geometry, "cube", 128, 7u32);
        let b = a.retain();
        let c = b.retain();
        let watch = a.watch();
        assert_eq!(watch.ref_count(), 3);
        assert!(Shared::ptr_eq(&a, &c));

        drop(a);
        drop(c);
        assert_eq!(watch.ref_count(), 1);
        assert!(!watch.is_disposed());
        assert_eq!(device.stats().live_bytes, 128);

        drop(b);
        assert!(watch.is_disposed());
        assert_eq!(device.stats().live_bytes, 0);
        assert_eq!(device.stats().invalid_frees, 0);
    }

    #[test]
    fn test_get_mut_requires_unique_reference() {
        let device = device();
        let mut a = Shared::new(device.clone(), ResourceKind::Material, "m", 16, 1u32);
        *a.get_mut().unwrap() = 2;
        let b = a.retain();
        assert!(a.get_mut().is_none());
        drop(b);
        assert_eq!(a.get_mut().copied(), Some(2));
    }

    #[test]
    fn test_make_mut_copies_only_when_shared() {
        let device = device();
        let mut a = Shared::new(device.clone(), ResourceKind::Material, "m", 16, 1u32);
        let id = a.id();
        *a.make_mut_with(|v| *v) = 2;
        assert_eq!(a.id(), id);

        let b = a.retain();
        *a.make_mut_with(|v| *v) += 10;
        assert_ne!(a.id(), id);
        assert_eq!((*a, *b), (12, 2));
        assert_eq!(b.ref_count(), 1);
        assert_eq!(device.stats().live_resources, 2);
    }

    #[test]
    fn test_duplicate_is_a_separate_allocation() {
        let device = device();
        let a = Shared::new(device.clone(), ResourceKind::Material, "m", 16, 1u32);
        let b = a.duplicate_with(|v| v + 1);
        assert_ne!(a.id(), b.id());
        assert_eq!(*b, 2);
        assert_eq!(device.stats().live_resources, 2);
        drop(a);
        assert_eq!(b.ref_count(), 1);
        assert_eq!(device.stats().live_resources, 1);
    }
}
