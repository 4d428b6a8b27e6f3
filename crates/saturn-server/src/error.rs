//! Error types for the job daemon.

use thiserror::Error;

/// Registration failures. Each one leaves the registry unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("job name must not be empty")]
    InvalidName,

    #[error("job '{0}' was registered without a handler")]
    NilHandler(String),

    #[error("job '{0}' is already registered")]
    DuplicateJob(String),
}

/// Daemon startup and serving failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, ServerError>;
