//! Demo daemon
//!
//! ```bash
//! cargo run -p demo-server
//! cargo run -p demo-client -- --name hello --args 'id=33&ver=22'
//! cargo run -p demo-client -- --name hello_stoppable
//! ```

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use saturn_server::{CancellationHandle, Endpoint, JobParams, JobServer};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Endpoint to listen on (socket path or host:port)
    #[arg(long, env = "SATURN_ENDPOINT", default_value_t = Endpoint::default())]
    socket: Endpoint,
}

async fn hello(params: JobParams, signature: String) -> bool {
    for (key, value) in &params {
        info!(signature = %signature, "{}: {}", key, value);
    }
    true
}

async fn hello_stoppable(_params: JobParams, signature: String, cancel: CancellationHandle) -> bool {
    for value in 1..=5 {
        info!(signature = %signature, "Processing value {}", value);
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(signature = %signature, "Received quit signal, exiting loop");
                return true;
            }
            _ = tokio::time::sleep(Duration::from_secs(3)) => {}
        }
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    saturn_server::add_job("hello", hello)?;
    saturn_server::add_cancellable_job("hello_stoppable", hello_stoppable)?;

    let server = JobServer::new(args.socket).bind().await?;
    info!("Demo jobs: hello, hello_stoppable");
    server
        .serve_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
