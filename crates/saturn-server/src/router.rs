//! Request Router: maps one inbound job request to the execution engine.
//!
//! [`JobRouter::dispatch`] is transport independent; [`handle_request`] adapts a
//! hyper request onto it and always answers `200 OK` with a single token body.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use http::header::{CONTENT_TYPE, HeaderValue};
use http_body_util::Full;
use hyper::{HeaderMap, Request, Response};
use saturn_protocol::{
    JobOutcome, JobParams, NOT_FOUND_BODY, RUN_SIGNATURE_HEADER, STOP_JOB_HEADER,
    STOP_SIGNATURE_HEADER, decode_job_name, decode_query, new_run_signature,
};
use tracing::{debug, error, warn};

use crate::execution::{resolve_run_signature, run_job, stop_job};
use crate::panic_trace;
use crate::registry::Registry;

/// One decoded job request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRequest {
    pub name: String,
    pub stop: bool,
    /// Run targeted by a stop request; `None` stops every run.
    pub stop_signature: Option<String>,
    /// Signature the caller assigned to a new run.
    pub run_signature: Option<String>,
    pub params: JobParams,
}

impl JobRequest {
    pub fn run(name: impl Into<String>, params: JobParams) -> Self {
        Self {
            name: name.into(),
            params,
            ..Default::default()
        }
    }

    pub fn stop(name: impl Into<String>, target: Option<String>) -> Self {
        Self {
            name: name.into(),
            stop: true,
            stop_signature: target,
            ..Default::default()
        }
    }

    pub fn with_run_signature(mut self, signature: impl Into<String>) -> Self {
        self.run_signature = Some(signature.into());
        self
    }

    /// Decode the job name, query and control headers of an HTTP request.
    ///
    /// The whole path after the leading `/` is the job name, so `/a/b` names the
    /// job `a/b`. Returns `None` only when the path cannot be percent-decoded
    /// to UTF-8.
    pub fn from_parts(path: &str, query: Option<&str>, headers: &HeaderMap) -> Option<Self> {
        let name = decode_job_name(path)?;
        let params = query.map(decode_query).unwrap_or_default();
        let stop = header_str(headers, STOP_JOB_HEADER)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        Some(Self {
            name,
            stop,
            stop_signature: header_str(headers, STOP_SIGNATURE_HEADER).map(str::to_string),
            run_signature: header_str(headers, RUN_SIGNATURE_HEADER).map(str::to_string),
            params,
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// What the router answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteReply {
    Outcome(JobOutcome),
    NotFound,
}

impl RouteReply {
    pub fn body(&self) -> &'static str {
        match self {
            RouteReply::Outcome(outcome) => outcome.as_str(),
            RouteReply::NotFound => NOT_FOUND_BODY,
        }
    }
}

/// Routes requests to jobs of one registry.
#[derive(Debug, Clone)]
pub struct JobRouter {
    registry: Arc<Registry>,
}

impl JobRouter {
    pub fn new(registry: Arc<Registry>) -> Self {
        panic_trace::install();
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Dispatch one request.
    ///
    /// Handler panics are contained here and reported as
    /// [`JobOutcome::Failure`]; run-table cleanup has already happened during
    /// unwinding.
    pub async fn dispatch(&self, request: JobRequest) -> RouteReply {
        let Some(job) = self.registry.lookup(&request.name) else {
            warn!(job = %request.name, "Job not found");
            return RouteReply::NotFound;
        };

        let JobRequest {
            name,
            stop,
            stop_signature,
            run_signature,
            params,
        } = request;

        if stop {
            debug!(job = %name, signature = ?stop_signature, "Dispatching stop request");
            return RouteReply::Outcome(stop_job(&job, stop_signature.as_deref()));
        }

        let signature =
            resolve_run_signature(run_signature.as_deref(), || Some(new_run_signature()));
        debug!(job = %name, signature = %signature, params = ?params, "Dispatching run request");

        let execution = run_job(&job, params.clone(), signature.clone());
        match std::panic::AssertUnwindSafe(execution).catch_unwind().await {
            Ok(outcome) => RouteReply::Outcome(outcome),
            Err(payload) => {
                let message = panic_trace::panic_message(payload.as_ref());
                let stack = panic_trace::take().unwrap_or_default();
                error!(
                    job = %name,
                    signature = %signature,
                    params = ?params,
                    panic = %message,
                    stack = %stack,
                    "Job handler panicked"
                );
                RouteReply::Outcome(JobOutcome::Failure)
            }
        }
    }
}

/// Serve one HTTP request.
///
/// The job runs on its own task so a client hanging up does not abort a
/// handler midway.
pub async fn handle_request<B>(
    req: Request<B>,
    router: JobRouter,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let uri = req.uri();
    let path = uri.path().to_string();
    let decoded = JobRequest::from_parts(&path, uri.query(), req.headers());
    drop(req);

    let reply = match decoded {
        Some(request) => {
            let name = request.name.clone();
            match tokio::spawn(async move { router.dispatch(request).await }).await {
                Ok(reply) => reply,
                Err(err) => {
                    error!(job = %name, error = %err, "Job task failed");
                    RouteReply::Outcome(JobOutcome::Failure)
                }
            }
        }
        None => {
            warn!(path = %path, "Request path is not a job name");
            RouteReply::NotFound
        }
    };

    let mut response = Response::new(Full::new(Bytes::from_static(reply.body().as_bytes())));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    Ok(response)
}
