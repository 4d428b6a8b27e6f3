//! Job handler traits.
//!
//! A job is a named unit of work reporting a boolean result. Plain jobs run to
//! completion; cancellable jobs additionally receive a [`CancellationHandle`]
//! they are expected to observe.
//!
//! Async closures implement both traits directly:
//!
//! ```rust
//! use saturn_server::{CancellationHandle, Job, JobParams};
//!
//! let plain = Job::plain(|params: JobParams, _signature: String| async move {
//!     params.get("ok").map(String::as_str) == Some("1")
//! });
//! assert!(!plain.is_cancellable());
//!
//! let looping = Job::cancellable(
//!     |_params: JobParams, _signature: String, cancel: CancellationHandle| async move {
//!         cancel.cancelled().await;
//!         true
//!     },
//! );
//! assert!(looping.is_cancellable());
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use saturn_protocol::JobParams;

use crate::cancellation::CancellationHandle;

/// A job that runs to completion.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Run once. `signature` is the run-signature assigned to this invocation.
    async fn run(&self, params: JobParams, signature: String) -> bool;
}

/// A job that can be stopped while running.
#[async_trait]
pub trait CancellableJobHandler: Send + Sync {
    /// Run once, returning early (with any value) after `cancel` fires.
    async fn run(&self, params: JobParams, signature: String, cancel: CancellationHandle) -> bool;
}

#[async_trait]
impl<F, Fut> JobHandler for F
where
    F: Fn(JobParams, String) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send + 'static,
{
    async fn run(&self, params: JobParams, signature: String) -> bool {
        (self)(params, signature).await
    }
}

#[async_trait]
impl<F, Fut> CancellableJobHandler for F
where
    F: Fn(JobParams, String, CancellationHandle) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send + 'static,
{
    async fn run(&self, params: JobParams, signature: String, cancel: CancellationHandle) -> bool {
        (self)(params, signature, cancel).await
    }
}

/// A registered handler of either kind.
#[derive(Clone)]
pub enum Job {
    Plain(Arc<dyn JobHandler>),
    Cancellable(Arc<dyn CancellableJobHandler>),
}

impl Job {
    pub fn plain<H: JobHandler + 'static>(handler: H) -> Self {
        Job::Plain(Arc::new(handler))
    }

    pub fn cancellable<H: CancellableJobHandler + 'static>(handler: H) -> Self {
        Job::Cancellable(Arc::new(handler))
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, Job::Cancellable(_))
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Job::Plain(_) => f.write_str("Job::Plain"),
            Job::Cancellable(_) => f.write_str("Job::Cancellable"),
        }
    }
}
