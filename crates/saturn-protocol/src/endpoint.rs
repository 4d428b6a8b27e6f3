//! Local transport endpoints.

use std::net::SocketAddr;
#[cfg(unix)]
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Where the daemon listens and the client connects.
///
/// Parsed from strings such as `/tmp/saturn.sock`, `unix:/run/saturn.sock` or
/// `127.0.0.1:8096`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Endpoint {
    /// Filesystem socket (POSIX only)
    #[cfg(unix)]
    Unix(PathBuf),
    /// Loopback TCP address
    Tcp(SocketAddr),
}

impl Endpoint {
    /// Build a socket endpoint from a filesystem path.
    #[cfg(unix)]
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Endpoint::Unix(path.into())
    }

    /// Build a TCP endpoint.
    pub fn tcp(addr: SocketAddr) -> Self {
        Endpoint::Tcp(addr)
    }

    /// Host value used in the `Host` header of requests sent to this endpoint.
    pub fn authority(&self) -> String {
        match self {
            #[cfg(unix)]
            Endpoint::Unix(_) => "unix".to_string(),
            Endpoint::Tcp(addr) => addr.to_string(),
        }
    }
}

impl Default for Endpoint {
    #[cfg(unix)]
    fn default() -> Self {
        Endpoint::Unix(PathBuf::from(crate::DEFAULT_SOCKET_PATH))
    }

    #[cfg(not(unix))]
    fn default() -> Self {
        Endpoint::Tcp(SocketAddr::from(([127, 0, 0, 1], 8096)))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(unix)]
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "{addr}"),
        }
    }
}

impl std::str::FromStr for Endpoint {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProtocolError::InvalidEndpoint("endpoint is empty".to_string()));
        }
        if let Ok(addr) = s.strip_prefix("tcp://").unwrap_or(s).parse::<SocketAddr>() {
            return Ok(Endpoint::Tcp(addr));
        }
        #[cfg(unix)]
        {
            let path = s.strip_prefix("unix:").unwrap_or(s);
            if path.is_empty() {
                return Err(ProtocolError::InvalidEndpoint(s.to_string()));
            }
            Ok(Endpoint::Unix(PathBuf::from(path)))
        }
        #[cfg(not(unix))]
        {
            Err(ProtocolError::InvalidEndpoint(format!(
                "{s} is not a socket address"
            )))
        }
    }
}

impl TryFrom<String> for Endpoint {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}
