//! Tests for error types

use slot_poller::core::{PollerError, ProbeError, RefreshError};
use std::error::Error;
use std::path::PathBuf;

#[test]
fn test_config_error() {
    let err = PollerError::Config("exam_dates must not be empty".to_string());
    assert_eq!(format!("{}", err), "config error: exam_dates must not be empty");
}

#[test]
fn test_refresh_error_is_transparent() {
    let err: PollerError = RefreshError::Failed("timed out".to_string()).into();
    assert_eq!(format!("{}", err), "credential refresh failed: timed out");
}

#[test]
fn test_read_credential_keeps_source() {
    let err = RefreshError::ReadCredential {
        path: PathBuf::from("secret.txt"),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
    };
    assert!(format!("{}", err).starts_with("can't read credential file secret.txt"));
    assert!(err.source().is_some());
}

#[test]
fn test_probe_errors() {
    assert_eq!(format!("{}", ProbeError::Status(502)), "unexpected status 502");
    assert_eq!(
        format!("{}", ProbeError::Transport("connection reset".to_string())),
        "transport error: connection reset"
    );
    assert_eq!(
        format!("{}", ProbeError::AuthRejected),
        "session rejected after credential refresh"
    );
}

#[test]
fn test_io_error_converts() {
    let err: PollerError = std::io::Error::other("no threads").into();
    assert!(matches!(err, PollerError::Io(_)));
}
