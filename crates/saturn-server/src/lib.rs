//! # Saturn Server
//!
//! Job registry and daemon for the Saturn job-invocation protocol.
//!
//! Jobs are registered by name, either as plain handlers that run to completion
//! or as cancellable handlers that receive a [`CancellationHandle`]. The daemon
//! serves invocations and stop requests over a local socket and answers each
//! with a [`JobOutcome`] token.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use saturn_server::{CancellationHandle, Endpoint, JobParams, JobServer, Registry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(Registry::new());
//!     registry.add_job("hello", |params: JobParams, _signature: String| async move {
//!         println!("hello {:?}", params);
//!         true
//!     })?;
//!     registry.add_cancellable_job(
//!         "hello_stoppable",
//!         |_params: JobParams, _signature: String, cancel: CancellationHandle| async move {
//!             cancel.cancelled().await;
//!             true
//!         },
//!     )?;
//!
//!     JobServer::builder()
//!         .endpoint(Endpoint::default())
//!         .registry(registry)
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cancellation;
pub mod error;
pub mod execution;
pub mod job;
pub mod panic_trace;
pub mod registry;
pub mod router;
pub mod run_tracker;
pub mod server;

pub use cancellation::CancellationHandle;
pub use error::{RegistryError, Result, ServerError};
pub use job::{CancellableJobHandler, Job, JobHandler};
pub use registry::{RegisteredJob, Registry};
pub use router::{JobRequest, JobRouter, RouteReply};
pub use run_tracker::{RunGuard, RunTracker};
pub use server::{BoundJobServer, JobServer, JobServerBuilder, ServerConfig};

pub use saturn_protocol::{Endpoint, JobOutcome, JobParams};

/// Register a plain job in the process-wide registry.
pub fn add_job<H>(name: &str, handler: H) -> std::result::Result<(), RegistryError>
where
    H: JobHandler + 'static,
{
    Registry::global().add_job(name, handler)
}

/// Register a cancellable job in the process-wide registry.
pub fn add_cancellable_job<H>(name: &str, handler: H) -> std::result::Result<(), RegistryError>
where
    H: CancellableJobHandler + 'static,
{
    Registry::global().add_cancellable_job(name, handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_functions_use_global_registry() {
        add_job("lib_test_plain", |_p: JobParams, _s: String| async { true }).unwrap();
        add_cancellable_job(
            "lib_test_cancellable",
            |_p: JobParams, _s: String, _c: CancellationHandle| async { true },
        )
        .unwrap();

        let global = Registry::global();
        assert!(global.contains("lib_test_plain"));
        assert!(global.lookup("lib_test_cancellable").unwrap().is_cancellable());
        assert!(matches!(
            add_job("lib_test_plain", |_p: JobParams, _s: String| async { false }),
            Err(RegistryError::DuplicateJob(_))
        ));
    }
}
