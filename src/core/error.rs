//! Error types for poller operations.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors produced while acquiring or refreshing the session credential.
///
/// Every variant is fatal to the process: no probe can make progress without
/// a valid credential.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The persisted credential could not be read.
    #[error("can't read credential file {path}: {source}")]
    ReadCredential {
        /// Path of the credential file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The persisted credential file is empty.
    #[error("credential file {0} is empty")]
    EmptyCredential(PathBuf),
    /// The external session could not be established at all.
    #[error("can't establish session: {0}")]
    Session(String),
    /// Interactive re-authentication did not finish in time.
    #[error("authorization not completed within {0:?}")]
    Timeout(Duration),
    /// A refresh led by another worker failed; carries its message.
    #[error("credential refresh failed: {0}")]
    Failed(String),
}

/// Errors reported by a single probe attempt.
///
/// Probe errors are per-task and never fatal.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),
    /// The resource answered with an unexpected status code.
    #[error("unexpected status {0}")]
    Status(u16),
    /// Evidence for a successful probe could not be stored.
    #[error("can't store evidence: {0}")]
    Evidence(#[from] std::io::Error),
    /// The resource kept demanding re-authentication after a refresh.
    #[error("session rejected after credential refresh")]
    AuthRejected,
}

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum PollerError {
    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(String),
    /// Credential acquisition failed.
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    /// A runtime or thread could not be created, or a worker panicked.
    #[error("runtime error: {0}")]
    Runtime(String),
    /// Filesystem or OS failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
