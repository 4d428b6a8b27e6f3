//! Cancellation Handle: cooperative, one-shot stop signal for a running job.
//!
//! Wraps a `tokio::sync::watch` channel so any number of observers can poll or
//! await the signal while the executor and stop requests hold clones.

use std::sync::Arc;

use tokio::sync::watch;

/// A one-shot, idempotent cancellation signal handed to cancellable jobs.
///
/// Clone-friendly: all clones observe the same state.
#[derive(Clone)]
pub struct CancellationHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancellationHandle {
    /// Fresh handle; nothing has asked the run to stop yet.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal cancellation. Idempotent; repeated calls are no-ops.
    ///
    /// Returns `true` only for the call that flipped the handle, so exactly
    /// one caller observes the transition.
    pub fn cancel(&self) -> bool {
        self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        })
    }

    /// Whether a stop has been requested. Never blocks.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once a stop has been requested, at once if it already was.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so `wait_for` cannot fail here
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Whether both handles are clones of the same signal.
    pub fn same_as(&self, other: &CancellationHandle) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
