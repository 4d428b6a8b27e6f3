//! The three-valued job result.

use serde::{Deserialize, Serialize};

/// Outcome of one job invocation, carried verbatim as the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobOutcome {
    /// The handler reported success (or a stop request found its target)
    Success,
    /// The handler reported failure, panicked, or the request could not be served
    Failure,
    /// The run was cancelled before it finished
    Interrupt,
}

impl JobOutcome {
    /// Wire token for this outcome
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Success => "success",
            JobOutcome::Failure => "failure",
            JobOutcome::Interrupt => "interrupt",
        }
    }

    /// Maps a handler's boolean return onto SUCCESS/FAILURE.
    pub fn from_success(ok: bool) -> Self {
        if ok {
            JobOutcome::Success
        } else {
            JobOutcome::Failure
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, JobOutcome::Failure)
    }
}

impl std::fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobOutcome {
    type Err = crate::ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "success" => Ok(JobOutcome::Success),
            "failure" => Ok(JobOutcome::Failure),
            "interrupt" => Ok(JobOutcome::Interrupt),
            other => Err(crate::ProtocolError::UnknownOutcome(other.to_string())),
        }
    }
}
