//! Core polling abstractions: tasks, the credential gate, the distributor
//! and the worker agents.

pub mod credential;
pub(crate) mod distributor;
pub mod error;
pub mod probe;
pub mod scheduler;
pub mod shutdown;
pub mod stats;
pub mod task;
pub(crate) mod worker;

pub use credential::{Credential, CredentialLease, CredentialRefresher, RefreshCoordinator};
pub use error::{AppResult, PollerError, ProbeError, RefreshError};
pub use probe::{Notification, Notifier, Probe, ProbeOutcome};
pub use scheduler::{worker_count, Scheduler};
pub use shutdown::Shutdown;
pub use stats::PollerStats;
pub use task::{PollTask, TaskHandle, TaskKey, TaskState};
