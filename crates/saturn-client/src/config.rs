//! Configuration types for the job client

use std::path::Path;
use std::time::Duration;

use saturn_protocol::Endpoint;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Default timeout for a run or stop request issued by the caller
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for the stop request sent after an interrupt
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Main client configuration
///
/// Loadable from TOML; timeouts are given in milliseconds:
///
/// ```toml
/// endpoint = "/tmp/saturn.sock"
/// request_timeout = 60000
/// stop_timeout = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Daemon endpoint
    pub endpoint: Endpoint,

    /// Timeout for the primary request
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,

    /// Timeout for the best-effort stop sent when interrupted
    #[serde(with = "duration_serde")]
    pub stop_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn from_toml_str(source: &str) -> ClientResult<Self> {
        toml::from_str(source).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Read a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }
}

/// Serialize Duration as milliseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
