//! Demo client
//!
//! ```bash
//! cargo run -p demo-client -- --name hello --args 'id=33&ver=22'
//! cargo run -p demo-client -- --name hello_stoppable --stop
//! ```

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    ExitCode::from(saturn_client::cmd::run_with_args(std::env::args_os()).await)
}
