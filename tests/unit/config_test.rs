//! Tests for configuration loading and validation

use slot_poller::config::{ExamType, PollerConfig};
use std::io::Write;
use std::time::Duration;

const VALID_JSON: &str = r#"{
    "exam_dates": ["15", "16"],
    "addresses": "Kyiv, Main st. 1; Lviv",
    "exam_type": 1,
    "log_level": "warn",
    "max_workers": 3,
    "interval_between_checks_secs": 30,
    "ttl_for_found_task_secs": 600,
    "ntfy_topic": "exam-slots"
}"#;

#[test]
fn test_from_json_str() {
    let cfg = PollerConfig::from_json_str(VALID_JSON).unwrap();

    assert_eq!(cfg.exam_dates, vec!["15", "16"]);
    assert_eq!(cfg.addresses, vec!["Kyiv, Main st. 1", "Lviv"]);
    assert_eq!(cfg.exam_type, ExamType::Practical);
    assert_eq!(cfg.max_workers, 3);
    assert_eq!(cfg.interval_between_checks(), Duration::from_secs(30));
    assert_eq!(cfg.ttl_for_found_task(), Duration::from_secs(600));
}

#[test]
fn test_defaults_fill_missing_fields() {
    let cfg = PollerConfig::from_json_str(VALID_JSON).unwrap();

    assert_eq!(cfg.default_timeout_secs, 10);
    assert_eq!(cfg.auth_timeout(), Duration::from_secs(600));
    assert_eq!(cfg.ntfy_server, "https://ntfy.sh");
    assert_eq!(cfg.credential_file.to_str(), Some("secret.txt"));
    assert_eq!(cfg.session_cookie, "__Secure-next-auth.session-token");
}

#[test]
fn test_exam_type_by_name() {
    let json = VALID_JSON.replace("\"exam_type\": 1", "\"exam_type\": \"theoretical\"");
    let cfg = PollerConfig::from_json_str(&json).unwrap();
    assert_eq!(cfg.exam_type, ExamType::Theoretical);
}

#[test]
fn test_invalid_json_is_rejected() {
    let err = PollerConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_missing_topic_is_rejected() {
    let json = VALID_JSON.replace("\"exam-slots\"", "\"\"");
    let err = PollerConfig::from_json_str(&json).unwrap_err();
    assert!(err.contains("ntfy_topic"));
}

#[test]
fn test_unknown_exam_type_is_rejected() {
    let json = VALID_JSON.replace("\"exam_type\": 1", "\"exam_type\": 7");
    assert!(PollerConfig::from_json_str(&json).is_err());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(VALID_JSON.as_bytes()).unwrap();

    let cfg = PollerConfig::load(file.path()).unwrap();
    assert!(!cfg.exam_dates.is_empty());
    assert_eq!(cfg.ntfy_topic, "exam-slots");
}

#[test]
fn test_load_reports_parse_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[1, 2").unwrap();

    let err = PollerConfig::load(file.path()).unwrap_err();
    assert!(format!("{}", err).contains("can't parse"));
}
