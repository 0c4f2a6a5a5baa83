//! Tests for builder modules

use slot_poller::builders::{build_scheduler, build_tasks};
use slot_poller::config::PollerConfig;
use slot_poller::infra::InMemoryNotifier;
use std::sync::Arc;
use std::time::Duration;

fn config(dates: &[&str], addresses: &[&str], max_workers: usize) -> PollerConfig {
    PollerConfig {
        exam_dates: dates.iter().map(ToString::to_string).collect(),
        addresses: addresses.iter().map(ToString::to_string).collect(),
        max_workers,
        ntfy_topic: "slots".to_string(),
        ..PollerConfig::default()
    }
}

#[test]
fn test_build_tasks_product() {
    let tasks = build_tasks(&["1", "2", "3"], &["a", "b"], Duration::from_secs(5));
    assert_eq!(tasks.len(), 6);
    assert_eq!(tasks[1].key().exam_date, "1");
    assert_eq!(tasks[1].key().address, "b");
}

#[test]
fn test_scheduler_worker_ceiling() {
    let cfg = config(&["15", "16"], &["Kyiv"], 5);
    let scheduler = build_scheduler(&cfg, Arc::new(InMemoryNotifier::new())).unwrap();
    assert_eq!(scheduler.worker_count(), 2);

    let cfg = config(&["15", "16"], &["Kyiv", "Lviv", "Odesa"], 4);
    let scheduler = build_scheduler(&cfg, Arc::new(InMemoryNotifier::new())).unwrap();
    assert_eq!(scheduler.worker_count(), 4);
}

#[test]
fn test_scheduler_tasks_use_configured_ttl() {
    let mut cfg = config(&["15"], &["Kyiv"], 1);
    cfg.ttl_for_found_task_secs = 90;
    let scheduler = build_scheduler(&cfg, Arc::new(InMemoryNotifier::new())).unwrap();

    assert_eq!(scheduler.tasks()[0].snapshot().ttl, Duration::from_secs(90));
}

#[test]
fn test_invalid_probe_url_is_rejected() {
    let mut cfg = config(&["15"], &["Kyiv"], 1);
    cfg.probe_url = "not a url".to_string();
    assert!(build_scheduler(&cfg, Arc::new(InMemoryNotifier::new())).is_err());
}
