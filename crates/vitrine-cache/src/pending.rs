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

//! The in-flight side of a cache entry: who is waiting, and who wants to
//! hear about progress.

use crate::LoadError;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;
use vitrine_core::{LoadProgress, ProgressObserver, SceneGraph};

/// What a waiter eventually receives: its own clone, or the shared error.
pub(crate) type Delivery = Result<SceneGraph, LoadError>;

/// A load that has been started and not yet resolved.
pub(crate) struct PendingLoad {
    load_id: u64,
    next_waiter: u64,
    waiters: Vec<Waiter>,
    /// Sequence number of the latest report; reports are numbered from 1.
    progress_seq: u64,
    last_progress: Option<LoadProgress>,
}

pub(crate) struct Waiter {
    id: u64,
    sender: oneshot::Sender<Delivery>,
    progress: Option<Arc<OrderedObserver>>,
}

/// A waiter's observer, remembering the last report it was given.
///
/// Reports are handed out after the cache lock is released, so a replay and
/// a live report can race. Anything older than what the observer already saw
/// is dropped.
pub(crate) struct OrderedObserver {
    inner: Arc<dyn ProgressObserver>,
    seen: Mutex<u64>,
}

impl OrderedObserver {
    fn new(inner: Arc<dyn ProgressObserver>) -> Self {
        Self {
            inner,
            seen: Mutex::new(0),
        }
    }

    /// Forwards report `seq` unless a later one already went out.
    pub(crate) fn notify(&self, seq: u64, progress: LoadProgress) {
        let mut seen = self.seen.lock();
        if seq > *seen {
            *seen = seq;
            self.inner.on_progress(progress);
        }
    }
}

/// Reports collected under the cache lock, delivered after it is released.
pub(crate) struct ProgressBatch {
    seq: u64,
    progress: LoadProgress,
    observers: Vec<Arc<OrderedObserver>>,
}

impl ProgressBatch {
    pub(crate) fn deliver(self) {
        for observer in self.observers {
            observer.notify(self.seq, self.progress);
        }
    }
}

impl Waiter {
    /// Hands the outcome over. Returns `false` if the receiver was dropped in
    /// the meantime, in which case `delivery` is dropped here.
    pub(crate) fn deliver(self, delivery: Delivery) -> bool {
        self.sender.send(delivery).is_ok()
    }
}

impl PendingLoad {
    pub(crate) fn new(load_id: u64) -> Self {
        Self {
            load_id,
            next_waiter: 0,
            waiters: Vec::new(),
            progress_seq: 0,
            last_progress: None,
        }
    }

    /// Distinguishes this load from earlier loads of the same identifier.
    pub(crate) fn load_id(&self) -> u64 {
        self.load_id
    }

    pub(crate) fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Enqueues a waiter and returns its id and the receiving end.
    ///
    /// An observing waiter that joins after progress was reported also gets
    /// a batch replaying the latest report to it alone.
    pub(crate) fn add_waiter(
        &mut self,
        progress: Option<Arc<dyn ProgressObserver>>,
    ) -> (u64, oneshot::Receiver<Delivery>, Option<ProgressBatch>) {
        let id = self.next_waiter;
        self.next_waiter += 1;
        let (sender, receiver) = oneshot::channel();
        let progress = progress.map(|inner| Arc::new(OrderedObserver::new(inner)));
        let replay = match (&progress, self.last_progress) {
            (Some(observer), Some(last)) => Some(ProgressBatch {
                seq: self.progress_seq,
                progress: last,
                observers: vec![Arc::clone(observer)],
            }),
            _ => None,
        };
        self.waiters.push(Waiter {
            id,
            sender,
            progress,
        });
        (id, receiver, replay)
    }

    /// Forgets a waiter whose `acquire` was dropped.
    pub(crate) fn remove_waiter(&mut self, id: u64) -> bool {
        let before = self.waiters.len();
        self.waiters.retain(|w| w.id != id);
        self.waiters.len() != before
    }

    /// Records `progress` and returns the batch to deliver once the cache
    /// lock is released.
    pub(crate) fn record_progress(&mut self, progress: LoadProgress) -> ProgressBatch {
        self.progress_seq += 1;
        self.last_progress = Some(progress);
        ProgressBatch {
            seq: self.progress_seq,
            progress,
            observers: self
                .waiters
                .iter()
                .filter_map(|w| w.progress.clone())
                .collect(),
        }
    }

    pub(crate) fn into_waiters(self) -> Vec<Waiter> {
        self.waiters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_removed_waiter_gets_nothing() {
        let mut pending = PendingLoad::new(7);
        let (first, mut first_rx, _) = pending.add_waiter(None);
        let (_, mut second_rx, _) = pending.add_waiter(None);
        assert_eq!(pending.waiter_count(), 2);

        assert!(pending.remove_waiter(first));
        assert!(!pending.remove_waiter(first));
        for waiter in pending.into_waiters() {
            assert!(waiter.deliver(Ok(SceneGraph::new())));
        }
        assert!(first_rx.try_recv().is_err());
        assert!(second_rx.try_recv().unwrap().is_ok());
    }

    #[test]
    fn test_progress_goes_to_observing_waiters_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer: Arc<dyn ProgressObserver> =
            Arc::new(move |p: LoadProgress| sink.lock().unwrap().push(p.loaded));

        let mut pending = PendingLoad::new(0);
        let _a = pending.add_waiter(Some(observer));
        let _b = pending.add_waiter(None);
        let batch = pending.record_progress(LoadProgress::new(10, Some(20)));
        assert_eq!(batch.observers.len(), 1);
        batch.deliver();
        assert_eq!(*seen.lock().unwrap(), vec![10]);
        assert_eq!(pending.last_progress, Some(LoadProgress::new(10, Some(20))));
    }

    #[test]
    fn test_delivery_to_dropped_receiver_fails() {
        let mut pending = PendingLoad::new(0);
        let (_, rx, _) = pending.add_waiter(None);
        drop(rx);
        let waiter = pending.into_waiters().pop().unwrap();
        assert!(!waiter.deliver(Ok(SceneGraph::new())));
    }

    #[test]
    fn test_stale_replay_is_dropped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer: Arc<dyn ProgressObserver> =
            Arc::new(move |p: LoadProgress| sink.lock().unwrap().push(p.loaded));

        let mut pending = PendingLoad::new(0);
        let _first = pending.add_waiter(None);
        pending.record_progress(LoadProgress::new(50, Some(100))).deliver();

        let (_, _rx, replay) = pending.add_waiter(Some(observer));
        let replay = replay.unwrap();
        // the live report overtakes the replay
        let live = pending.record_progress(LoadProgress::new(100, Some(100)));
        live.deliver();
        replay.deliver();

        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }

    #[test]
    fn test_replay_only_for_observing_late_joiners() {
        let observer: Arc<dyn ProgressObserver> = Arc::new(|_: LoadProgress| {});
        let mut pending = PendingLoad::new(0);
        let (_, _rx, early) = pending.add_waiter(Some(observer.clone()));
        assert!(early.is_none());

        pending.record_progress(LoadProgress::new(5, None));
        let (_, _rx, blind) = pending.add_waiter(None);
        assert!(blind.is_none());
        let (_, _rx, late) = pending.add_waiter(Some(observer));
        let late = late.unwrap();
        assert_eq!(late.progress, LoadProgress::new(5, None));
        assert_eq!(late.observers.len(), 1);
    }
}
