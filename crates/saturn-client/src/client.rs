//! Client Invoker: sends a [`Task`] to the daemon and races it against
//! process interrupts.

use std::time::Duration;

use bytes::Bytes;
use http::header::HOST;
use http_body_util::Empty;
use hyper::{Method, Request};
use saturn_protocol::{
    Endpoint, JobOutcome, JobParams, NOT_FOUND_BODY, RUN_SIGNATURE_HEADER, STOP_JOB_HEADER,
    STOP_SIGNATURE_HEADER, new_run_signature,
};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::signal::{InterruptSource, NoInterrupt, OsSignals};
use crate::task::Task;
use crate::transport;

/// Invokes jobs on a daemon.
#[derive(Debug, Clone, Default)]
pub struct JobClient {
    config: ClientConfig,
}

impl JobClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn with_endpoint(endpoint: Endpoint) -> Self {
        Self::new(ClientConfig::default().with_endpoint(endpoint))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run `task`, treating process termination signals as interrupts.
    pub async fn run(&self, task: &Task) -> JobOutcome {
        match OsSignals::new() {
            Ok(signals) => self.run_with_interrupt(task, signals).await,
            Err(err) => {
                warn!(job = %task.name, error = %err, "Signal handlers unavailable, running without interrupt support");
                self.run_with_interrupt(task, NoInterrupt).await
            }
        }
    }

    /// Run `task`, racing the request against `interrupt`.
    ///
    /// The first of {response, interrupt} decides the outcome. On interrupt an
    /// invocation (not a stop request) is followed by a stop request for the
    /// run it started, bounded by the stop timeout; the pending response is
    /// abandoned and [`JobOutcome::Interrupt`] returned.
    pub async fn run_with_interrupt<I>(&self, task: &Task, mut interrupt: I) -> JobOutcome
    where
        I: InterruptSource,
    {
        if task.name.trim().is_empty() {
            error!("Job name is required");
            return JobOutcome::Failure;
        }
        let params = match task.merged_params() {
            Ok(params) => params,
            Err(err) => {
                error!(job = %task.name, args = %task.args, error = %err, "Invalid task arguments");
                return JobOutcome::Failure;
            }
        };
        let run_signature = (!task.stop).then(new_run_signature);
        let signature = run_signature
            .as_deref()
            .or(task.stop_signature())
            .unwrap_or_default()
            .to_string();

        let request = self.request(task, run_signature.as_deref(), self.config.request_timeout);
        tokio::select! {
            result = request => self.interpret(task, &signature, &params, result),
            Some(reason) = interrupt.recv() => {
                warn!(job = %task.name, signature = %signature, signal = %reason, "Received interrupt, abandoning request");
                if let Some(run_signature) = &run_signature {
                    self.stop_run(&task.name, run_signature).await;
                }
                JobOutcome::Interrupt
            }
        }
    }

    /// Ask the daemon to stop the run tagged `signature`. Errors are logged only.
    async fn stop_run(&self, name: &str, signature: &str) {
        let stop = Task::stop(name, Some(signature.to_string()));
        match self.request(&stop, None, self.config.stop_timeout).await {
            Ok(body) => {
                info!(job = %name, signature = %signature, response = %body.trim(), "Stop request sent after interrupt")
            }
            Err(err) => {
                error!(job = %name, signature = %signature, error = %err, "Stop request after interrupt failed")
            }
        }
    }

    /// Send the request for `task` and return the raw response body.
    pub async fn request(
        &self,
        task: &Task,
        run_signature: Option<&str>,
        timeout: Duration,
    ) -> ClientResult<String> {
        let request = build_request(&self.config.endpoint, task, run_signature)?;
        debug!(job = %task.name, uri = %request.uri(), stop = task.stop, "Sending job request");
        tokio::time::timeout(timeout, transport::send(&self.config.endpoint, request))
            .await
            .map_err(|_| ClientError::Timeout)?
    }

    fn interpret(
        &self,
        task: &Task,
        signature: &str,
        params: &JobParams,
        result: ClientResult<String>,
    ) -> JobOutcome {
        let body = match result {
            Ok(body) => body,
            Err(err) => {
                error!(job = %task.name, signature = %signature, params = ?params, error = %err, "Job request failed");
                return JobOutcome::Failure;
            }
        };

        match body.parse::<JobOutcome>() {
            Ok(outcome) => {
                match outcome {
                    JobOutcome::Success => {
                        info!(job = %task.name, signature = %signature, params = ?params, "Job execution succeeded")
                    }
                    JobOutcome::Interrupt => {
                        warn!(job = %task.name, signature = %signature, params = ?params, "Job execution interrupted")
                    }
                    JobOutcome::Failure => {
                        error!(job = %task.name, signature = %signature, params = ?params, "Job execution failed")
                    }
                }
                outcome
            }
            Err(_) if body.trim() == NOT_FOUND_BODY => {
                error!(job = %task.name, "Job does not exist");
                JobOutcome::Failure
            }
            Err(err) => {
                error!(job = %task.name, signature = %signature, error = %err, "Unexpected response body");
                JobOutcome::Failure
            }
        }
    }
}

fn build_request(
    endpoint: &Endpoint,
    task: &Task,
    run_signature: Option<&str>,
) -> ClientResult<Request<Empty<Bytes>>> {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri(task.request_target()?)
        .header(HOST, endpoint.authority());

    if task.stop {
        builder = builder.header(STOP_JOB_HEADER, "true");
        if let Some(target) = task.stop_signature() {
            builder = builder.header(STOP_SIGNATURE_HEADER, target);
        }
    } else if let Some(signature) = run_signature {
        builder = builder.header(RUN_SIGNATURE_HEADER, signature);
    }

    Ok(builder.body(Empty::new())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ChannelInterrupt;
    use tracing_test::traced_test;

    fn unreachable_client() -> JobClient {
        // Nothing listens on port 1 of the loopback interface
        JobClient::new(
            ClientConfig::default()
                .with_endpoint(Endpoint::tcp("127.0.0.1:1".parse().unwrap()))
                .with_request_timeout(Duration::from_secs(2)),
        )
    }

    #[test]
    fn test_run_request_carries_signature_only() {
        let task = Task::new("job").with_param("id", "1");
        let request = build_request(&Endpoint::default(), &task, Some("sig-1")).unwrap();
        assert_eq!(request.uri(), "/job?id=1");
        assert_eq!(request.headers()[RUN_SIGNATURE_HEADER], "sig-1");
        assert!(request.headers().get(STOP_JOB_HEADER).is_none());
        assert!(request.headers().get(STOP_SIGNATURE_HEADER).is_none());
    }

    #[test]
    fn test_stop_request_carries_stop_headers() {
        let task = Task::stop("job", Some("sig-9".into()));
        let request = build_request(&Endpoint::default(), &task, Some("ignored")).unwrap();
        assert_eq!(request.headers()[STOP_JOB_HEADER], "true");
        assert_eq!(request.headers()[STOP_SIGNATURE_HEADER], "sig-9");
        assert!(request.headers().get(RUN_SIGNATURE_HEADER).is_none());

        let request = build_request(&Endpoint::default(), &Task::stop("job", None), None).unwrap();
        assert!(request.headers().get(STOP_SIGNATURE_HEADER).is_none());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_empty_name_fails_without_request() {
        let outcome = unreachable_client()
            .run_with_interrupt(&Task::new(""), NoInterrupt)
            .await;
        assert_eq!(outcome, JobOutcome::Failure);
        assert!(!logs_contain("Sending job request"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_bad_args_fail_without_request() {
        let task = Task::new("job").with_args("a=%4");
        let outcome = unreachable_client().run_with_interrupt(&task, NoInterrupt).await;
        assert_eq!(outcome, JobOutcome::Failure);
        assert!(logs_contain("Invalid task arguments"));
        assert!(!logs_contain("Sending job request"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_connection_refused_is_failure() {
        let outcome = unreachable_client()
            .run_with_interrupt(&Task::new("job"), NoInterrupt)
            .await;
        assert_eq!(outcome, JobOutcome::Failure);
        assert!(logs_contain("Job request failed"));
    }

    #[test]
    fn test_interpret_bodies() {
        let client = JobClient::default();
        let task = Task::new("job");
        let params = JobParams::new();
        let outcome = |body: &str| client.interpret(&task, "s", &params, Ok(body.to_string()));
        assert_eq!(outcome("success"), JobOutcome::Success);
        assert_eq!(outcome("failure"), JobOutcome::Failure);
        assert_eq!(outcome("interrupt"), JobOutcome::Interrupt);
        assert_eq!(outcome("not exist"), JobOutcome::Failure);
        assert_eq!(outcome("garbage"), JobOutcome::Failure);
        assert_eq!(
            client.interpret(&task, "s", &params, Err(ClientError::Timeout)),
            JobOutcome::Failure
        );
    }

    #[tokio::test]
    async fn test_interrupt_before_response_wins() {
        // A listener that accepts but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let client = JobClient::new(
            ClientConfig::default()
                .with_endpoint(Endpoint::tcp(addr))
                .with_stop_timeout(Duration::from_millis(200)),
        );
        let (tx, interrupt) = ChannelInterrupt::new();
        let task = Task::new("job");
        let run = client.run_with_interrupt(&task, interrupt);
        tokio::pin!(run);

        tokio::select! {
            _ = &mut run => panic!("request should still be pending"),
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
        }
        tx.send("SIGINT".to_string()).unwrap();
        assert_eq!(run.await, JobOutcome::Interrupt);
        silent.abort();
    }

    /// Set in the child process spawned by
    /// `test_termination_signal_kills_process_after_run`.
    #[cfg(unix)]
    const SIGNAL_CHILD_ENV: &str = "SATURN_CLIENT_SIGNAL_CHILD";

    #[cfg(unix)]
    #[test]
    fn test_termination_signal_kills_process_after_run() {
        use std::os::unix::process::ExitStatusExt;

        if std::env::var_os(SIGNAL_CHILD_ENV).is_some() {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let outcome = runtime.block_on(unreachable_client().run(&Task::new("job")));
            assert_eq!(outcome, JobOutcome::Failure);

            // SAFETY: signalling our own process
            unsafe { libc::kill(std::process::id() as libc::pid_t, libc::SIGTERM) };
            std::thread::sleep(Duration::from_millis(500));
            println!("process survived SIGTERM after JobClient::run returned");
            return;
        }

        let status = std::process::Command::new(std::env::current_exe().unwrap())
            .args([
                "--exact",
                "client::tests::test_termination_signal_kills_process_after_run",
                "--nocapture",
            ])
            .env(SIGNAL_CHILD_ENV, "1")
            .status()
            .unwrap();
        assert_eq!(status.signal(), Some(libc::SIGTERM), "child status: {status:?}");
    }
}
