//! # Saturn Protocol
//!
//! Wire vocabulary shared by the Saturn job daemon and its clients.
//!
//! A job invocation is a single HTTP/1.1 `GET` exchanged over a local transport
//! (a filesystem socket on POSIX, a loopback TCP port on Windows):
//!
//! - the path carries the percent-encoded job name (`/hello_stoppable`)
//! - the query carries the job parameters (`?id=42&ver=2`)
//! - [`RUN_SIGNATURE_HEADER`] tags the run so it can be stopped later
//! - [`STOP_JOB_HEADER`] (`true`) turns the request into a stop request, optionally
//!   narrowed to one run with [`STOP_SIGNATURE_HEADER`]
//!
//! The response body is always one of the [`JobOutcome`] tokens, or
//! [`NOT_FOUND_BODY`] when the daemon has no job under that name.
//!
//! ```rust
//! use saturn_protocol::{JobOutcome, JobParams, encode_query, decode_query};
//!
//! let mut params = JobParams::new();
//! params.insert("id".to_string(), "42".to_string());
//! let query = encode_query(&params);
//! assert_eq!(decode_query(&query), params);
//!
//! assert_eq!("interrupt".parse::<JobOutcome>().unwrap(), JobOutcome::Interrupt);
//! ```

pub mod endpoint;
pub mod error;
pub mod outcome;
pub mod params;
pub mod signature;

pub use endpoint::Endpoint;
pub use error::{ProtocolError, Result};
pub use outcome::JobOutcome;
pub use params::{
    JobParams, decode_job_name, decode_query, encode_job_name, encode_query, parse_legacy_args,
};
pub use signature::{FALLBACK_SIGNATURE, new_run_signature};

/// Header carrying the run-signature of an executing run.
pub const RUN_SIGNATURE_HEADER: &str = "run_signature";

/// Header carrying the run-signature a stop request targets.
pub const STOP_SIGNATURE_HEADER: &str = "stop_signature";

/// Header flagging a request as a stop request (value `true`).
pub const STOP_JOB_HEADER: &str = "stop_job";

/// Response body for a job name the daemon does not know.
pub const NOT_FOUND_BODY: &str = "not exist";

/// Default filesystem socket used by the daemon on POSIX systems.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/saturn.sock";

/// Default loopback address used by the daemon where local sockets are unavailable.
pub const DEFAULT_TCP_ADDRESS: &str = "127.0.0.1:8096";
