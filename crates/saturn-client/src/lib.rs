//! # Saturn Client
//!
//! Invokes jobs on a Saturn daemon over its local socket.
//!
//! ```rust,no_run
//! use saturn_client::{JobClient, JobOutcome, Task};
//!
//! # async fn example() {
//! let client = JobClient::default();
//! let task = Task::new("hello").with_param("id", "33");
//! match client.run(&task).await {
//!     JobOutcome::Success => println!("done"),
//!     JobOutcome::Interrupt => println!("interrupted"),
//!     JobOutcome::Failure => println!("failed"),
//! }
//! # }
//! ```

pub mod client;
pub mod cmd;
pub mod config;
pub mod error;
pub mod signal;
pub mod task;
pub mod transport;

pub use client::JobClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use signal::{ChannelInterrupt, InterruptSource, NoInterrupt, OsSignals};
pub use task::Task;

pub use saturn_protocol::{Endpoint, JobOutcome, JobParams};
