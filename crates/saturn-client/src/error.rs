//! Error types for client operations.
//!
//! These never reach the caller of [`JobClient::run`](crate::JobClient::run):
//! every failure is logged and reported as
//! [`JobOutcome::Failure`](saturn_protocol::JobOutcome::Failure).

use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Invalid args: {0}")]
    InvalidArgs(#[from] saturn_protocol::ProtocolError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<http::Error> for ClientError {
    fn from(err: http::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
