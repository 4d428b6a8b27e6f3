//! Execution Engine: runs one invocation or one stop request against a
//! registered job and reduces it to a [`JobOutcome`].

use saturn_protocol::{FALLBACK_SIGNATURE, JobOutcome, JobParams};
use tracing::{error, info, warn};

use crate::cancellation::CancellationHandle;
use crate::job::Job;
use crate::registry::RegisteredJob;

/// Pick the run-signature for an invocation.
///
/// A non-blank caller-supplied signature is used as-is. Otherwise `generate` is
/// asked for a fresh one, and [`FALLBACK_SIGNATURE`] stands in when it yields
/// nothing usable.
pub fn resolve_run_signature<G>(supplied: Option<&str>, generate: G) -> String
where
    G: FnOnce() -> Option<String>,
{
    if let Some(signature) = supplied.filter(|s| !s.trim().is_empty()) {
        return signature.to_string();
    }
    generate()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SIGNATURE.to_string())
}

/// Run `job` once under `signature`.
///
/// Cancellable runs are tracked for the duration of the handler call; a run
/// whose handle was signalled reports [`JobOutcome::Interrupt`] whatever the
/// handler returned.
pub async fn run_job(job: &RegisteredJob, params: JobParams, signature: String) -> JobOutcome {
    let name = job.name();
    let outcome = match job.job() {
        Job::Plain(handler) => {
            let ok = handler.run(params.clone(), signature.clone()).await;
            JobOutcome::from_success(ok)
        }
        Job::Cancellable(handler) => {
            let Some(runs) = job.runs() else {
                error!(job = %name, signature = %signature, "Cancellable job has no run table");
                return JobOutcome::Failure;
            };
            let cancel = CancellationHandle::new();
            let ok = {
                let _guard = runs.start_run(&signature, cancel.clone());
                handler
                    .run(params.clone(), signature.clone(), cancel.clone())
                    .await
            };
            if cancel.is_cancelled() {
                JobOutcome::Interrupt
            } else {
                JobOutcome::from_success(ok)
            }
        }
    };

    match outcome {
        JobOutcome::Success => {
            info!(job = %name, signature = %signature, params = ?params, "Job execution succeeded")
        }
        JobOutcome::Interrupt => {
            warn!(job = %name, signature = %signature, params = ?params, "Job execution interrupted")
        }
        JobOutcome::Failure => {
            error!(job = %name, signature = %signature, params = ?params, "Job execution failed")
        }
    }
    outcome
}

/// Stop one run of `job` (when `target` names a signature) or all of its runs.
pub fn stop_job(job: &RegisteredJob, target: Option<&str>) -> JobOutcome {
    let name = job.name();
    let Some(runs) = job.runs() else {
        error!(job = %name, "Stop requested for a job that cannot be stopped");
        return JobOutcome::Failure;
    };

    let target = target.filter(|s| !s.is_empty());
    let found = match target {
        Some(signature) => runs.cancel_one(signature),
        None => runs.cancel_all(),
    };
    let signature = target.unwrap_or("*");
    if found {
        info!(job = %name, signature = %signature, "Stopped job execution");
        JobOutcome::Success
    } else {
        warn!(job = %name, signature = %signature, "No running execution to stop");
        JobOutcome::Failure
    }
}
