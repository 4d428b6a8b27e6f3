//! Stop requests against cancellable runs.

mod support;

use std::sync::Arc;

use saturn_client::{NoInterrupt, Task};
use saturn_protocol::{JobOutcome, JobParams};
use saturn_server::{CancellationHandle, CancellableJobHandler, Registry};
use support::{TestDaemon, next_signature, register_echo, register_loop, wait_until};

#[tokio::test]
async fn test_stop_by_signature_interrupts_run() {
    let registry = Arc::new(Registry::new());
    let mut started = register_loop(&registry);
    let daemon = TestDaemon::start(Arc::clone(&registry)).await;

    let client = daemon.client();
    let run = tokio::spawn(async move {
        client.run_with_interrupt(&Task::new("loop"), NoInterrupt).await
    });
    let signature = next_signature(&mut started).await;

    let stop = Task::stop("loop", Some(signature.clone()));
    assert_eq!(
        daemon.client().run_with_interrupt(&stop, NoInterrupt).await,
        JobOutcome::Success
    );
    assert_eq!(run.await.unwrap(), JobOutcome::Interrupt);

    // The run left the table, so stopping it again finds nothing
    let runs = registry.runs("loop").unwrap();
    wait_until(|| !runs.contains(&signature)).await;
    assert_eq!(
        daemon.client().run_with_interrupt(&stop, NoInterrupt).await,
        JobOutcome::Failure
    );

    daemon.stop().await;
}

#[tokio::test]
async fn test_stop_targets_only_named_run() {
    let registry = Arc::new(Registry::new());
    let mut started = register_loop(&registry);
    let daemon = TestDaemon::start(Arc::clone(&registry)).await;

    let spawn_run = |daemon: &TestDaemon| {
        let client = daemon.client();
        tokio::spawn(async move {
            client.run_with_interrupt(&Task::new("loop"), NoInterrupt).await
        })
    };
    let first = spawn_run(&daemon);
    let sig_a = next_signature(&mut started).await;
    let second = spawn_run(&daemon);
    let sig_b = next_signature(&mut started).await;

    let stop_a = Task::stop("loop", Some(sig_a.clone()));
    assert_eq!(
        daemon.client().run_with_interrupt(&stop_a, NoInterrupt).await,
        JobOutcome::Success
    );
    assert_eq!(first.await.unwrap(), JobOutcome::Interrupt);

    let runs = registry.runs("loop").unwrap();
    assert!(runs.contains(&sig_b));
    assert!(!second.is_finished());

    let stop_b = Task::stop("loop", Some(sig_b));
    assert_eq!(
        daemon.client().run_with_interrupt(&stop_b, NoInterrupt).await,
        JobOutcome::Success
    );
    assert_eq!(second.await.unwrap(), JobOutcome::Interrupt);

    daemon.stop().await;
}

#[tokio::test]
async fn test_stop_without_signature_stops_all_runs() {
    let registry = Arc::new(Registry::new());
    let mut started = register_loop(&registry);
    let daemon = TestDaemon::start(Arc::clone(&registry)).await;

    let mut runs = Vec::new();
    for _ in 0..3 {
        let client = daemon.client();
        runs.push(tokio::spawn(async move {
            client.run_with_interrupt(&Task::new("loop"), NoInterrupt).await
        }));
        next_signature(&mut started).await;
    }

    let stop_all = Task::stop("loop", None);
    assert_eq!(
        daemon.client().run_with_interrupt(&stop_all, NoInterrupt).await,
        JobOutcome::Success
    );
    for run in runs {
        assert_eq!(run.await.unwrap(), JobOutcome::Interrupt);
    }

    // Nothing left to stop
    assert_eq!(
        daemon.client().run_with_interrupt(&stop_all, NoInterrupt).await,
        JobOutcome::Failure
    );

    daemon.stop().await;
}

#[tokio::test]
async fn test_stop_before_any_run_is_failure() {
    let registry = Arc::new(Registry::new());
    let _started = register_loop(&registry);
    let daemon = TestDaemon::start(registry).await;

    let stop = Task::stop("loop", Some("never-started".to_string()));
    assert_eq!(
        daemon.client().run_with_interrupt(&stop, NoInterrupt).await,
        JobOutcome::Failure
    );

    daemon.stop().await;
}

#[tokio::test]
async fn test_stop_plain_job_is_failure() {
    let registry = Arc::new(Registry::new());
    register_echo(&registry);
    let daemon = TestDaemon::start(registry).await;

    assert_eq!(
        daemon
            .client()
            .run_with_interrupt(&Task::stop("echo", None), NoInterrupt)
            .await,
        JobOutcome::Failure
    );

    daemon.stop().await;
}

struct Exploding;

#[async_trait::async_trait]
impl CancellableJobHandler for Exploding {
    async fn run(&self, _params: JobParams, _signature: String, _cancel: CancellationHandle) -> bool {
        panic!("job exploded");
    }
}

#[tokio::test]
async fn test_panicking_job_fails_and_daemon_survives() {
    let registry = Arc::new(Registry::new());
    registry.add_cancellable_job("explode", Exploding).unwrap();
    register_echo(&registry);
    let daemon = TestDaemon::start(Arc::clone(&registry)).await;
    let client = daemon.client();

    assert_eq!(
        client.run_with_interrupt(&Task::new("explode"), NoInterrupt).await,
        JobOutcome::Failure
    );
    assert!(registry.runs("explode").unwrap().is_empty());

    // Daemon keeps serving
    let ok = Task::new("echo").with_param("ok", "1");
    assert_eq!(client.run_with_interrupt(&ok, NoInterrupt).await, JobOutcome::Success);

    daemon.stop().await;
}
