//! Shared fixtures for the end-to-end tests: a daemon on a private socket and
//! a handful of jobs with observable behaviour.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use saturn_client::{ClientConfig, JobClient};
use saturn_protocol::Endpoint;
use saturn_server::{CancellationHandle, JobParams, JobServer, Registry};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// A daemon serving `registry` until dropped or stopped.
pub struct TestDaemon {
    pub registry: Arc<Registry>,
    pub endpoint: Endpoint,
    shutdown: Option<oneshot::Sender<()>>,
    serving: Option<JoinHandle<saturn_server::Result<()>>>,
    _dir: Option<tempfile::TempDir>,
}

impl TestDaemon {
    pub async fn start(registry: Arc<Registry>) -> Self {
        #[cfg(unix)]
        let (endpoint, dir) = {
            let dir = tempfile::tempdir().expect("temp dir");
            (Endpoint::unix(dir.path().join("saturn.sock")), Some(dir))
        };
        #[cfg(not(unix))]
        let (endpoint, dir) = (Endpoint::tcp("127.0.0.1:0".parse().unwrap()), None);

        let bound = JobServer::builder()
            .endpoint(endpoint)
            .registry(Arc::clone(&registry))
            .build()
            .bind()
            .await
            .expect("daemon should bind");
        let endpoint = bound.local_endpoint().clone();

        let (tx, rx) = oneshot::channel::<()>();
        let serving = tokio::spawn(bound.serve_with_shutdown(async {
            let _ = rx.await;
        }));

        Self {
            registry,
            endpoint,
            shutdown: Some(tx),
            serving: Some(serving),
            _dir: dir,
        }
    }

    pub fn client(&self) -> JobClient {
        JobClient::new(self.client_config())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_endpoint(self.endpoint.clone())
            .with_request_timeout(Duration::from_secs(10))
            .with_stop_timeout(Duration::from_secs(2))
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(serving) = self.serving.take() {
            serving
                .await
                .expect("serve task")
                .expect("daemon should stop cleanly");
        }
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Plain job succeeding when `ok=1`.
pub fn register_echo(registry: &Registry) {
    registry
        .add_job("echo", |params: JobParams, _signature: String| async move {
            params.get("ok").map(String::as_str) == Some("1")
        })
        .unwrap();
}

/// Cancellable job that announces its run-signature and waits to be stopped.
pub fn register_loop(registry: &Registry) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    registry
        .add_cancellable_job(
            "loop",
            move |_params: JobParams, signature: String, cancel: CancellationHandle| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(signature);
                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => return true,
                            _ = tokio::time::sleep(Duration::from_millis(10)) => {}
                        }
                    }
                }
            },
        )
        .unwrap();
    rx
}

/// Poll `condition` until it holds or a generous deadline passes.
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub async fn next_signature(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("run should start")
        .expect("job channel open")
}
