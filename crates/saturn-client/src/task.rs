//! Task: one client-side job invocation or stop request.

use saturn_protocol::{JobParams, encode_job_name, encode_query, parse_legacy_args};

use crate::error::{ClientError, ClientResult};

/// Describes what to ask the daemon for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    /// Job name (required)
    pub name: String,
    /// Legacy flat query string, e.g. `id=1&x=9`
    pub args: String,
    /// Structured parameters; win over `args` on key collisions
    pub params: JobParams,
    /// Ask the daemon to stop runs of the job instead of starting one
    pub stop: bool,
    /// Run targeted by a stop request; empty stops every run
    pub signature: String,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Stop request for `name`, optionally narrowed to one run.
    pub fn stop(name: impl Into<String>, signature: Option<String>) -> Self {
        Self {
            name: name.into(),
            stop: true,
            signature: signature.unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.args = args.into();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: JobParams) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Structured parameters overlaid on the legacy args.
    pub fn merged_params(&self) -> ClientResult<JobParams> {
        let mut merged = self.params.clone();
        if !self.args.trim().is_empty() {
            for (key, value) in parse_legacy_args(self.args.trim())? {
                merged.entry(key).or_insert(value);
            }
        }
        Ok(merged)
    }

    /// Path and query of the request for this task.
    pub fn request_target(&self) -> ClientResult<String> {
        if self.name.trim().is_empty() {
            return Err(ClientError::InvalidTask("job name is required".to_string()));
        }
        let path = encode_job_name(&self.name);
        let query = encode_query(&self.merged_params()?);
        if query.is_empty() {
            Ok(path)
        } else {
            Ok(format!("{path}?{query}"))
        }
    }

    /// Target run of a stop request, if any.
    pub fn stop_signature(&self) -> Option<&str> {
        Some(self.signature.trim()).filter(|s| !s.is_empty())
    }
}
