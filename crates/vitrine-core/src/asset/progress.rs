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

/// A snapshot of how many bytes of an asset have been transferred.
///
/// The loader reports these as it goes; the cache forwards them untouched to
/// every observer waiting on the same load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    /// Bytes received so far.
    pub loaded: u64,
    /// Total expected bytes, when the transport knows it.
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Creates a new progress snapshot.
    pub fn new(loaded: u64, total: Option<u64>) -> Self {
        Self { loaded, total }
    }

    /// Completion in `[0.0, 1.0]`, or `None` if the total is unknown or zero.
    pub fn fraction(&self) -> Option<f32> {
        match self.total {
            Some(total) if total > 0 => Some((self.loaded as f64 / total as f64).min(1.0) as f32),
            _ => None,
        }
    }

    /// Completion as a percentage in `[0.0, 100.0]`.
    pub fn percent(&self) -> Option<f32> {
        self.fraction().map(|f| f * 100.0)
    }

    /// Returns `true` once every expected byte has arrived.
    pub fn is_complete(&self) -> bool {
        matches!(self.total, Some(total) if self.loaded >= total)
    }
}

/// Receives progress updates for a load.
///
/// Implemented for any `Fn(LoadProgress)` closure, so callers can simply pass
/// `|p| println!("{:?}", p.percent())`.
pub trait ProgressObserver: Send + Sync {
    /// Called every time the loader reports new progress.
    fn on_progress(&self, progress: LoadProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(LoadProgress) + Send + Sync,
{
    fn on_progress(&self, progress: LoadProgress) {
        self(progress)
    }
}

/// An observer that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreProgress;

impl ProgressObserver for IgnoreProgress {
    fn on_progress(&self, _progress: LoadProgress) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_percent() {
        assert_eq!(LoadProgress::new(50, Some(200)).percent(), Some(25.0));
        assert_eq!(LoadProgress::new(50, None).percent(), None);
        assert_eq!(LoadProgress::new(0, Some(0)).percent(), None);
        assert_eq!(LoadProgress::new(300, Some(200)).fraction(), Some(1.0));
    }

    #[test]
    fn test_closure_is_observer() {
        let seen = Mutex::new(Vec::new());
        let observer = |p: LoadProgress| seen.lock().unwrap().push(p.loaded);
        observer.on_progress(LoadProgress::new(1, Some(2)));
        observer.on_progress(LoadProgress::new(2, Some(2)));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert!(LoadProgress::new(2, Some(2)).is_complete());
    }
}
