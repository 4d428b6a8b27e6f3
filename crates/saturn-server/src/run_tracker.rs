//! Run Tracker: per-job table of in-flight cancellable runs.
//!
//! Maps run-signature -> [`CancellationHandle`]. An entry exists only while the
//! tagged run is executing: the engine tracks it right before the handler is
//! invoked and a [`RunGuard`] releases it on every exit path, unwinding included.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cancellation::CancellationHandle;

/// Run table for one cancellable job.
#[derive(Debug, Default)]
pub struct RunTracker {
    runs: Mutex<HashMap<String, CancellationHandle>>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `handle` under `signature`.
    ///
    /// Blank signatures are ignored and `false` is returned. A signature that is
    /// already tracked is taken over by the newer run.
    pub fn track(&self, signature: &str, handle: CancellationHandle) -> bool {
        if signature.trim().is_empty() {
            return false;
        }
        if let Some(previous) = self.runs.lock().insert(signature.to_string(), handle) {
            debug!(signature = %signature, cancelled = previous.is_cancelled(), "Run signature re-tracked by a newer run");
        }
        true
    }

    /// Remove the entry for `signature`. Returns whether one was present.
    pub fn untrack(&self, signature: &str) -> bool {
        self.runs.lock().remove(signature).is_some()
    }

    /// Remove the entry for `signature` only if it still belongs to `handle`.
    pub fn release(&self, signature: &str, handle: &CancellationHandle) -> bool {
        let mut runs = self.runs.lock();
        match runs.get(signature) {
            Some(current) if current.same_as(handle) => {
                runs.remove(signature);
                true
            }
            _ => false,
        }
    }

    /// Signal and remove the run tagged `signature`. Returns whether it was found.
    ///
    /// The handle is signalled before the lock is released, so a run whose
    /// release finds its entry gone is guaranteed to observe the cancellation.
    pub fn cancel_one(&self, signature: &str) -> bool {
        let mut runs = self.runs.lock();
        match runs.remove(signature) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Signal and remove every run currently tracked. Returns whether any was found.
    ///
    /// Works on a snapshot: runs tracked after the table is drained are left alone.
    pub fn cancel_all(&self) -> bool {
        let mut runs = self.runs.lock();
        let found = !runs.is_empty();
        for (_, handle) in runs.drain() {
            handle.cancel();
        }
        found
    }

    /// Track `handle` and return a guard that releases it when dropped.
    pub fn start_run(self: &Arc<Self>, signature: &str, handle: CancellationHandle) -> RunGuard {
        self.track(signature, handle.clone());
        RunGuard {
            tracker: Arc::clone(self),
            signature: signature.to_string(),
            handle,
        }
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.runs.lock().contains_key(signature)
    }

    pub fn len(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.lock().is_empty()
    }

    /// Signatures currently tracked, sorted.
    pub fn signatures(&self) -> Vec<String> {
        let mut signatures: Vec<String> = self.runs.lock().keys().cloned().collect();
        signatures.sort();
        signatures
    }
}

/// Scoped registration of one run; untracks it on drop.
#[must_use = "dropping the guard untracks the run immediately"]
pub struct RunGuard {
    tracker: Arc<RunTracker>,
    signature: String,
    handle: CancellationHandle,
}

impl RunGuard {
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn handle(&self) -> &CancellationHandle {
        &self.handle
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.tracker.release(&self.signature, &self.handle);
    }
}
