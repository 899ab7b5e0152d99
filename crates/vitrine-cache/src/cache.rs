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

use crate::{
    metrics::CacheMetrics,
    pending::{PendingLoad, Waiter},
    CacheConfig, CheckoutHandle, CheckoutId, LoadError, ReleaseError,
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use vitrine_core::{
    asset::IdentifierError, math::LinearRgba, AssetId, AssetLoader, DecodeError, DisposeReport,
    LoadProgress, ProgressObserver, SceneGraph,
};
use vitrine_telemetry::{MetricsRegistry, MetricsResult};

static NEXT_CACHE_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Where an identifier currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    /// Neither cached nor loading.
    Absent,
    /// A load is in flight.
    Pending {
        /// `acquire` calls currently waiting on it.
        waiters: usize,
    },
    /// A canonical instance is cached.
    Cached,
}

enum Entry {
    Pending(PendingLoad),
    Cached(SceneGraph),
}

/// Everything guarded by the cache lock.
#[derive(Default)]
struct CacheState {
    entries: HashMap<AssetId, Entry>,
    /// Checkouts issued and not yet released.
    checkouts: HashMap<CheckoutId, AssetId>,
    /// Outstanding checkouts per identifier, kept in step with `checkouts`.
    outstanding: HashMap<AssetId, usize>,
    next_checkout: u64,
    next_load: u64,
}

impl CacheState {
    fn cached_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, Entry::Cached(_)))
            .count()
    }

    fn outstanding_for(&self, id: &str) -> usize {
        self.outstanding.get(id).copied().unwrap_or(0)
    }

    fn issue_checkout(&mut self, id: AssetId) -> CheckoutId {
        let checkout = CheckoutId(self.next_checkout);
        self.next_checkout += 1;
        *self.outstanding.entry(id.clone()).or_insert(0) += 1;
        self.checkouts.insert(checkout, id);
        checkout
    }

    /// Drops `checkout` from the ledger. Returns `false` if it was not there.
    fn retire_checkout(&mut self, checkout: CheckoutId) -> bool {
        let Some(id) = self.checkouts.remove(&checkout) else {
            return false;
        };
        if let Some(count) = self.outstanding.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.outstanding.remove(&id);
            }
        }
        true
    }

    fn pending_mut(&mut self, id: &AssetId, load_id: u64) -> Option<&mut PendingLoad> {
        match self.entries.get_mut(id) {
            Some(Entry::Pending(pending)) if pending.load_id() == load_id => Some(pending),
            _ => None,
        }
    }

    /// Removes the pending marker of load `load_id`, returning its waiters.
    fn take_waiters(&mut self, id: &AssetId, load_id: u64) -> Vec<Waiter> {
        if self.pending_mut(id, load_id).is_none() {
            return Vec::new();
        }
        match self.entries.remove(id) {
            Some(Entry::Pending(pending)) => pending.into_waiters(),
            _ => Vec::new(),
        }
    }
}

pub(crate) struct CacheShared {
    token: u64,
    loader: Arc<dyn AssetLoader>,
    config: CacheConfig,
    default_color: LinearRgba,
    state: Mutex<CacheState>,
    metrics: CacheMetrics,
}

/// Deduplicating cache of decoded scenes.
///
/// The cache owns one canonical [`SceneGraph`] per identifier and never hands
/// it out. Every successful [`acquire`](Self::acquire) returns a
/// [`CheckoutHandle`] around a fresh deep clone: geometry and textures are
/// shared by reference count, materials and the node hierarchy are copied.
///
/// Concurrent acquires of an identifier that is not cached yet share a
/// single load. Loads run as tokio tasks, so `acquire` must be awaited from
/// within a tokio runtime. Dropping an `acquire` future only withdraws that
/// caller; the load goes on and its result is still cached.
///
/// `ResourceCache` is a cheap handle: clones share the same entries.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use vitrine_cache::{CacheConfig, ResourceCache};
/// # async fn demo(loader: Arc<dyn vitrine_core::AssetLoader>) -> Result<(), Box<dyn std::error::Error>> {
/// let cache = ResourceCache::new(loader, CacheConfig::default())?;
/// let handle = cache.acquire("models/Duck.glb").await?;
/// println!("{} nodes", handle.root().len());
/// cache.release(handle)?;
/// assert!(cache.evict_if_unused("models/Duck.glb"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ResourceCache {
    shared: Arc<CacheShared>,
}

impl ResourceCache {
    /// Creates a cache whose metrics go to a private registry.
    pub fn new(loader: Arc<dyn AssetLoader>, config: CacheConfig) -> MetricsResult<Self> {
        Self::with_metrics(loader, config, &MetricsRegistry::new())
    }

    /// Creates a cache reporting its metrics to `registry`.
    pub fn with_metrics(
        loader: Arc<dyn AssetLoader>,
        config: CacheConfig,
        registry: &MetricsRegistry,
    ) -> MetricsResult<Self> {
        let metrics = CacheMetrics::register(registry)?;
        Ok(Self {
            shared: Arc::new(CacheShared {
                token: NEXT_CACHE_TOKEN.fetch_add(1, Ordering::Relaxed),
                loader,
                default_color: config.default_material_rgba(),
                config,
                state: Mutex::new(CacheState::default()),
                metrics,
            }),
        })
    }

    /// The configuration this cache was created with.
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Checks out a private copy of the asset named `id`, loading it first
    /// if needed.
    pub async fn acquire(&self, id: impl AsRef<str>) -> Result<CheckoutHandle, LoadError> {
        self.acquire_inner(id.as_ref(), None).await
    }

    /// Like [`acquire`](Self::acquire), forwarding load progress to
    /// `progress`.
    ///
    /// Progress is only reported while a load is in flight. A caller joining
    /// a running load first receives the latest report.
    pub async fn acquire_with_progress(
        &self,
        id: impl AsRef<str>,
        progress: impl ProgressObserver + 'static,
    ) -> Result<CheckoutHandle, LoadError> {
        self.acquire_inner(id.as_ref(), Some(Arc::new(progress)))
            .await
    }

    async fn acquire_inner(
        &self,
        raw: &str,
        progress: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<CheckoutHandle, LoadError> {
        let shared = &self.shared;
        let id = shared.parse_identifier(raw)?;
        shared.metrics.acquire();

        let (load_id, waiter, receiver) = {
            let mut state = shared.state.lock();
            let hit = match state.entries.get(&id) {
                Some(Entry::Cached(canonical)) => Some(canonical.deep_clone()),
                _ => None,
            };
            if let Some(clone) = hit {
                shared.metrics.hit();
                log::debug!("Cache hit for '{id}'");
                return Ok(shared.check_out(&mut state, id, clone));
            }

            match state.entries.get_mut(&id) {
                Some(Entry::Pending(pending)) => {
                    let (waiter, receiver, replay) = pending.add_waiter(progress);
                    let load_id = pending.load_id();
                    drop(state);

                    shared.metrics.join();
                    log::debug!("Joining pending load of '{id}'");
                    if let Some(replay) = replay {
                        replay.deliver();
                    }
                    (load_id, waiter, receiver)
                }
                _ => {
                    let load_id = state.next_load;
                    state.next_load += 1;
                    let mut pending = PendingLoad::new(load_id);
                    let (waiter, receiver, _) = pending.add_waiter(progress);
                    state.entries.insert(id.clone(), Entry::Pending(pending));
                    drop(state);

                    shared.metrics.decode_started();
                    log::info!("Loading '{id}'");
                    spawn_load(Arc::clone(shared), id.clone(), load_id);
                    (load_id, waiter, receiver)
                }
            }
        };

        let guard = WaiterGuard {
            shared,
            id: &id,
            load_id,
            waiter,
            armed: true,
        };
        let delivery = receiver.await;
        guard.disarm();

        match delivery {
            Ok(Ok(clone)) => {
                let mut state = shared.state.lock();
                Ok(shared.check_out(&mut state, id, clone))
            }
            Ok(Err(error)) => Err(error),
            Err(_) => Err(LoadError::LoadAbandoned { id }),
        }
    }

    /// Checks out a copy only if `id` is already cached. Never starts a load.
    pub fn try_acquire(&self, id: impl AsRef<str>) -> Option<CheckoutHandle> {
        let shared = &self.shared;
        let id = shared.parse_identifier(id.as_ref()).ok()?;
        let mut state = shared.state.lock();
        let clone = match state.entries.get(&id) {
            Some(Entry::Cached(canonical)) => canonical.deep_clone(),
            _ => return None,
        };
        shared.metrics.acquire();
        shared.metrics.hit();
        log::debug!("Cache hit for '{id}'");
        Some(shared.check_out(&mut state, id, clone))
    }

    /// Gives a handle back and disposes its copy.
    ///
    /// The canonical instance and other handles are left alone. A handle
    /// issued by another cache is refused and returned inside the error.
    pub fn release(&self, handle: CheckoutHandle) -> Result<DisposeReport, ReleaseError> {
        self.shared.release(handle)
    }

    /// Evicts and disposes the canonical instance of `id`.
    ///
    /// Returns `false` when `id` is not cached, including while a load is in
    /// flight. Outstanding handles are not consulted; their copies stay
    /// valid until released.
    pub fn evict_if_unused(&self, id: impl AsRef<str>) -> bool {
        let id = id.as_ref();
        let (key, mut canonical, outstanding) = {
            let mut state = self.shared.state.lock();
            if !matches!(state.entries.get(id), Some(Entry::Cached(_))) {
                return false;
            }
            let Some((key, Entry::Cached(canonical))) = state.entries.remove_entry(id) else {
                return false;
            };
            self.shared.metrics.set_cached_entries(state.cached_count());
            (key, canonical, state.outstanding_for(id))
        };

        let report = canonical.dispose();
        self.shared.metrics.evicted();
        log::info!(
            "Evicted '{key}': {} resources freed, {outstanding} checkout(s) still outstanding",
            report.freed
        );
        true
    }

    /// Evicts every cached instance; pending loads are left running.
    /// Returns how many instances were evicted.
    pub fn evict_all_unused(&self) -> usize {
        let evicted: Vec<(AssetId, SceneGraph)> = {
            let mut state = self.shared.state.lock();
            let ids: Vec<AssetId> = state
                .entries
                .iter()
                .filter(|(_, e)| matches!(e, Entry::Cached(_)))
                .map(|(id, _)| id.clone())
                .collect();
            let mut evicted = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(Entry::Cached(canonical)) = state.entries.remove(&id) {
                    evicted.push((id, canonical));
                }
            }
            self.shared.metrics.set_cached_entries(state.cached_count());
            evicted
        };

        let count = evicted.len();
        for (id, mut canonical) in evicted {
            let report = canonical.dispose();
            self.shared.metrics.evicted();
            log::info!("Evicted '{id}': {} resources freed", report.freed);
        }
        count
    }

    /// Where `id` currently stands.
    pub fn state(&self, id: impl AsRef<str>) -> AssetState {
        match self.shared.state.lock().entries.get(id.as_ref()) {
            None => AssetState::Absent,
            Some(Entry::Pending(pending)) => AssetState::Pending {
                waiters: pending.waiter_count(),
            },
            Some(Entry::Cached(_)) => AssetState::Cached,
        }
    }

    /// Returns `true` if a canonical instance of `id` is cached.
    pub fn contains(&self, id: impl AsRef<str>) -> bool {
        self.state(id) == AssetState::Cached
    }

    /// Identifiers of every cached instance, sorted.
    pub fn cached_ids(&self) -> Vec<AssetId> {
        let state = self.shared.state.lock();
        let mut ids: Vec<AssetId> = state
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, Entry::Cached(_)))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Handles issued by this cache and not yet released.
    pub fn outstanding_checkouts(&self) -> usize {
        self.shared.state.lock().checkouts.len()
    }

    /// Outstanding handles for `id`.
    pub fn outstanding_for(&self, id: impl AsRef<str>) -> usize {
        self.shared.state.lock().outstanding_for(id.as_ref())
    }
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ResourceCache")
            .field("token", &self.shared.token)
            .field("entries", &state.entries.len())
            .field("cached", &state.cached_count())
            .field("checkouts", &state.checkouts.len())
            .finish()
    }
}

impl CacheShared {
    fn parse_identifier(&self, raw: &str) -> Result<AssetId, LoadError> {
        let max = self.config.max_identifier_len;
        let checked = if raw.len() > max {
            Err(IdentifierError::TooLong {
                len: raw.len(),
                max,
            })
        } else {
            AssetId::parse(raw)
        };
        checked.map_err(|reason| {
            log::debug!("Rejected asset identifier {raw:?}: {reason}");
            LoadError::InvalidIdentifier {
                raw: raw.to_owned(),
                reason,
            }
        })
    }

    fn check_out(
        self: &Arc<Self>,
        state: &mut CacheState,
        id: AssetId,
        graph: SceneGraph,
    ) -> CheckoutHandle {
        let checkout = state.issue_checkout(id.clone());
        self.metrics.set_outstanding(state.checkouts.len());
        CheckoutHandle {
            checkout,
            id,
            graph,
            cache: Arc::downgrade(self),
            cache_token: self.token,
            settled: false,
        }
    }

    pub(crate) fn release(&self, mut handle: CheckoutHandle) -> Result<DisposeReport, ReleaseError> {
        if handle.cache_token != self.token {
            log::error!(
                "Refusing checkout {} of '{}': handle was not issued by this cache",
                handle.checkout,
                handle.id
            );
            return Err(ReleaseError::DisposeOfUnknownHandle(Box::new(handle)));
        }

        let retired = {
            let mut state = self.state.lock();
            let retired = state.retire_checkout(handle.checkout);
            self.metrics.set_outstanding(state.checkouts.len());
            retired
        };
        if !retired {
            log::error!(
                "Checkout {} of '{}' released twice",
                handle.checkout,
                handle.id
            );
            handle.settled = true;
            return Err(ReleaseError::DoubleRelease {
                id: handle.id.clone(),
                checkout: handle.checkout,
            });
        }

        self.metrics.released();
        let (checkout, id) = (handle.checkout, handle.id.clone());
        let report = handle.settle();
        log::debug!(
            "Released checkout {checkout} of '{id}': {} references dropped, {} resources freed",
            report.released,
            report.freed
        );
        Ok(report)
    }

    /// Retires a checkout whose handle was dropped without release.
    ///
    /// Handles carrying another cache's token never touch this ledger.
    pub(crate) fn retire(&self, token: u64, checkout: CheckoutId) {
        if token != self.token {
            return;
        }
        let mut state = self.state.lock();
        if state.retire_checkout(checkout) {
            self.metrics.released();
        }
        self.metrics.set_outstanding(state.checkouts.len());
    }

    fn finish(&self, id: &AssetId, load_id: u64, result: Result<SceneGraph, DecodeError>) {
        match result {
            Ok(mut canonical) => {
                if self.config.apply_default_materials {
                    let patched = canonical.apply_default_materials(self.default_color);
                    if patched > 0 {
                        log::debug!("Gave {patched} node(s) of '{id}' a default material");
                    }
                }

                let mut state = self.state.lock();
                let waiters = state.take_waiters(id, load_id);
                let total = waiters.len();
                let delivered = waiters
                    .into_iter()
                    .map(|waiter| waiter.deliver(Ok(canonical.deep_clone())))
                    .filter(|delivered| *delivered)
                    .count();
                log::info!(
                    "Loaded '{id}': {} nodes, {} meshes, {delivered}/{total} waiter(s) served",
                    canonical.len(),
                    canonical.mesh_count()
                );
                state.entries.insert(id.clone(), Entry::Cached(canonical));
                self.metrics.set_cached_entries(state.cached_count());
            }
            Err(error) => {
                self.metrics.decode_failed();
                log::warn!("Failed to load '{id}': {error}");
                let error = LoadError::DecodeFailed {
                    id: id.clone(),
                    cause: Arc::new(error),
                };
                let waiters = self.state.lock().take_waiters(id, load_id);
                for waiter in waiters {
                    waiter.deliver(Err(error.clone()));
                }
            }
        }
    }

    fn abandon(&self, id: &AssetId, load_id: u64) {
        let waiters = self.state.lock().take_waiters(id, load_id);
        log::error!(
            "Load of '{id}' ended without a result; failing {} waiter(s)",
            waiters.len()
        );
        let error = LoadError::LoadAbandoned { id: id.clone() };
        for waiter in waiters {
            waiter.deliver(Err(error.clone()));
        }
    }
}

impl Drop for CacheShared {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for (id, entry) in state.entries.drain() {
            if let Entry::Cached(mut canonical) = entry {
                let report = canonical.dispose();
                log::trace!("Disposed '{id}' with the cache: {} resources freed", report.freed);
            }
        }
    }
}

fn spawn_load(shared: Arc<CacheShared>, id: AssetId, load_id: u64) {
    tokio::spawn(async move {
        let abandon = AbandonGuard {
            shared: &shared,
            id: &id,
            load_id,
            armed: true,
        };
        let fanout = ProgressFanout {
            shared: &shared,
            id: &id,
            load_id,
        };
        let result = {
            let _timer = shared.metrics.decode_timer();
            shared.loader.load(&id, &fanout).await
        };
        abandon.disarm();
        shared.finish(&id, load_id, result);
    });
}

/// Forwards loader progress to every waiter that asked for it.
struct ProgressFanout<'a> {
    shared: &'a CacheShared,
    id: &'a AssetId,
    load_id: u64,
}

impl ProgressObserver for ProgressFanout<'_> {
    fn on_progress(&self, progress: LoadProgress) {
        let batch = match self.shared.state.lock().pending_mut(self.id, self.load_id) {
            Some(pending) => pending.record_progress(progress),
            None => return,
        };
        batch.deliver();
    }
}

/// Fails the waiters of a load whose task unwinds or is dropped.
struct AbandonGuard<'a> {
    shared: &'a CacheShared,
    id: &'a AssetId,
    load_id: u64,
    armed: bool,
}

impl AbandonGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.abandon(self.id, self.load_id);
        }
    }
}

/// Withdraws a waiter when its `acquire` future is dropped.
struct WaiterGuard<'a> {
    shared: &'a CacheShared,
    id: &'a AssetId,
    load_id: u64,
    waiter: u64,
    armed: bool,
}

impl WaiterGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.shared.state.lock();
        if let Some(pending) = state.pending_mut(self.id, self.load_id) {
            if pending.remove_waiter(self.waiter) {
                log::debug!(
                    "Acquire of '{}' cancelled; {} waiter(s) left",
                    self.id,
                    pending.waiter_count()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use vitrine_core::{
        resource::{ResourceDevice, ResourceKind, Shared, TrackingDevice},
        scene::Geometry,
        Material, NodeKind, SceneNode,
    };

    struct OneMesh {
        device: Arc<TrackingDevice>,
        loads: AtomicUsize,
    }

    #[async_trait]
    impl AssetLoader for OneMesh {
        async fn load(
            &self,
            _id: &AssetId,
            _progress: &dyn ProgressObserver,
        ) -> Result<SceneGraph, DecodeError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let device: Arc<dyn ResourceDevice> = self.device.clone();
            let geometry = Geometry::triangle();
            let geometry = Shared::new(
                device.clone(),
                ResourceKind::Geometry,
                "tri",
                geometry.byte_size(),
                geometry,
            );
            let material = Shared::new(
                device,
                ResourceKind::Material,
                "paint",
                Material::UNIFORM_BYTES,
                Material::standard(LinearRgba::WHITE),
            );
            let mut graph = SceneGraph::new();
            let root = graph.add_root(SceneNode::group()).unwrap();
            graph
                .add_child(root, SceneNode::new(NodeKind::Mesh { geometry, material }))
                .unwrap();
            Ok(graph)
        }
    }

    fn cache() -> (ResourceCache, Arc<TrackingDevice>) {
        let device = Arc::new(TrackingDevice::new());
        let loader = Arc::new(OneMesh {
            device: device.clone(),
            loads: AtomicUsize::new(0),
        });
        (
            ResourceCache::new(loader, CacheConfig::default()).unwrap(),
            device,
        )
    }

    fn forge(handle: &CheckoutHandle) -> CheckoutHandle {
        CheckoutHandle {
            checkout: handle.checkout,
            id: handle.id.clone(),
            graph: handle.graph.deep_clone(),
            cache: handle.cache.clone(),
            cache_token: handle.cache_token,
            settled: false,
        }
    }

    #[tokio::test]
    async fn test_second_release_of_a_checkout_is_rejected() {
        let (cache, device) = cache();
        let handle = cache.acquire("a.glb").await.unwrap();
        let forged = forge(&handle);
        let checkout = handle.checkout_id();

        cache.release(handle).unwrap();
        assert_eq!(cache.outstanding_checkouts(), 0);

        match cache.release(forged) {
            Err(ReleaseError::DoubleRelease { id, checkout: c }) => {
                assert_eq!(id.as_str(), "a.glb");
                assert_eq!(c, checkout);
            }
            other => panic!("expected DoubleRelease, got {other:?}"),
        }
        assert_eq!(cache.outstanding_checkouts(), 0);
        assert_eq!(device.stats().invalid_frees, 0);

        // the canonical instance is untouched
        let again = cache.try_acquire("a.glb").unwrap();
        assert_eq!(again.root().mesh_count(), 1);
        cache.release(again).unwrap();
    }

    #[tokio::test]
    async fn test_forged_token_is_unknown_handle() {
        let (cache, _device) = cache();
        let handle = cache.acquire("a.glb").await.unwrap();
        let mut stranger = forge(&handle);
        stranger.cache_token = u64::MAX;

        let err = cache.release(stranger).unwrap_err();
        assert!(matches!(err, ReleaseError::DisposeOfUnknownHandle(_)));
        assert_eq!(cache.outstanding_checkouts(), 1);
        cache.release(handle).unwrap();
        assert_eq!(cache.outstanding_checkouts(), 0);
    }

    #[tokio::test]
    async fn test_dropped_stranger_keeps_real_checkout() {
        let (cache, device) = cache();
        let handle = cache.acquire("a.glb").await.unwrap();
        let mut stranger = forge(&handle);
        stranger.cache_token = u64::MAX;

        let stranger = match cache.release(stranger) {
            Err(ReleaseError::DisposeOfUnknownHandle(stranger)) => stranger,
            other => panic!("expected DisposeOfUnknownHandle, got {other:?}"),
        };
        assert!(!stranger.settled);
        drop(stranger);

        assert_eq!(cache.outstanding_checkouts(), 1);
        assert_eq!(cache.outstanding_for("a.glb"), 1);
        assert_eq!(device.stats().invalid_frees, 0);
        cache.release(handle).unwrap();
        assert_eq!(cache.outstanding_for("a.glb"), 0);
    }

    #[tokio::test]
    async fn test_outstanding_count_per_identifier() {
        let (cache, _device) = cache();
        let a1 = cache.acquire("a.glb").await.unwrap();
        let a2 = cache.acquire("a.glb").await.unwrap();
        let b = cache.acquire("b.glb").await.unwrap();
        assert_eq!(cache.outstanding_for("a.glb"), 2);
        assert_eq!(cache.outstanding_for("b.glb"), 1);

        cache.release(a1).unwrap();
        drop(b);
        assert_eq!(cache.outstanding_for("a.glb"), 1);
        assert_eq!(cache.outstanding_for("b.glb"), 0);
        assert!(cache.shared.state.lock().outstanding.get("b.glb").is_none());

        cache.release(a2).unwrap();
        assert_eq!(cache.outstanding_checkouts(), 0);
        assert!(cache.shared.state.lock().outstanding.is_empty());
    }

    #[test]
    fn test_identifier_length_limit() {
        let device = Arc::new(TrackingDevice::new());
        let loader = Arc::new(OneMesh {
            device,
            loads: AtomicUsize::new(0),
        });
        let config = CacheConfig {
            max_identifier_len: 8,
            ..Default::default()
        };
        let cache = ResourceCache::new(loader, config).unwrap();
        assert!(cache.shared.parse_identifier("short.glb").is_err());
        assert!(matches!(
            cache.shared.parse_identifier("a.glb"),
            Ok(id) if id.as_str() == "a.glb"
        ));
        assert!(matches!(
            cache.shared.parse_identifier("a\tb"),
            Err(LoadError::InvalidIdentifier {
                reason: IdentifierError::ControlCharacter { position: 1 },
                ..
            })
        ));
    }
}
