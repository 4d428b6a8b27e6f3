//! `saturn` command line: invoke or stop one job and report the outcome.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use saturn_protocol::{Endpoint, JobOutcome, JobParams};
use tracing::debug;

use crate::client::JobClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::task::Task;

/// Exit status for success and interrupt
pub const EXIT_OK: u8 = 0;

/// Exit status for failures, argument errors included
pub const EXIT_FAILURE: u8 = 1;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "saturn", author, version, about = "Invoke or stop jobs on a Saturn daemon", long_about = None)]
pub struct Cli {
    /// Job name
    #[arg(short, long)]
    pub name: String,

    /// Job parameters as a query string, e.g. "id=1&ver=2"
    #[arg(short, long, default_value = "")]
    pub args: String,

    /// Job parameter as key=value; repeatable, wins over --args
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Stop running executions of the job instead of starting one
    #[arg(long)]
    pub stop: bool,

    /// Run signature to stop; all runs are stopped when omitted
    #[arg(long, default_value = "")]
    pub signature: String,

    /// Daemon endpoint (socket path or host:port)
    #[arg(long, visible_alias = "endpoint", env = "SATURN_ENDPOINT")]
    pub socket: Option<Endpoint>,

    /// TOML client configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("parameter key is empty in {raw:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Cli {
    pub fn task(&self) -> Task {
        let params: JobParams = self.params.iter().cloned().collect();
        Task {
            name: self.name.clone(),
            args: self.args.clone(),
            params,
            stop: self.stop,
            signature: self.signature.clone(),
        }
    }

    /// Client configuration: file (if any), then the endpoint override.
    pub fn client_config(&self) -> ClientResult<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(endpoint) = &self.socket {
            config.endpoint = endpoint.clone();
        }
        Ok(config)
    }

    pub async fn execute(&self) -> ClientResult<JobOutcome> {
        let config = self.client_config()?;
        debug!(endpoint = %config.endpoint, "Using daemon endpoint");
        let client = JobClient::new(config);
        Ok(client.run(&self.task()).await)
    }
}

/// Line printed for an outcome.
pub fn outcome_line(outcome: JobOutcome) -> &'static str {
    match outcome {
        JobOutcome::Success => "Execution Success",
        JobOutcome::Interrupt => "Execution Interrupted",
        JobOutcome::Failure => "Execution Failure",
    }
}

pub fn exit_status(outcome: JobOutcome) -> u8 {
    if outcome.is_failure() {
        EXIT_FAILURE
    } else {
        EXIT_OK
    }
}

/// Parse `args`, run the command and return the process exit status.
pub async fn run_with_args<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version are reported through the same path
            return if err.use_stderr() { EXIT_FAILURE } else { EXIT_OK };
        }
    };

    let outcome = match cli.execute().await {
        Ok(outcome) => outcome,
        Err(ClientError::Config(message)) => {
            eprintln!("Configuration error: {message}");
            JobOutcome::Failure
        }
        Err(err) => {
            eprintln!("{err}");
            JobOutcome::Failure
        }
    };
    eprintln!("{}", outcome_line(outcome));
    exit_status(outcome)
}
