//! Tests for task state and freshness

use slot_poller::core::{PollTask, TaskKey, TaskState};
use std::time::{Duration, Instant};

#[test]
fn test_key_display() {
    let key = TaskKey::new(" 15 ", " Kyiv ");
    assert_eq!(key.to_string(), "DATE: 15; CITY: Kyiv");
}

#[test]
fn test_freshness_window() {
    let now = Instant::now();
    let mut state = TaskState::new(Duration::from_secs(10));
    state.mark_found(now.checked_sub(Duration::from_secs(5)).unwrap());
    assert!(state.is_fresh(now));

    state.ttl = Duration::from_secs(1);
    assert!(!state.is_fresh(now));
}

#[test]
fn test_zero_ttl_is_never_fresh() {
    let now = Instant::now();
    let mut state = TaskState::new(Duration::ZERO);
    state.mark_found(now);
    assert!(!state.is_fresh(now));
}

#[test]
fn test_second_claim_fails_while_held() {
    let task = PollTask::new(TaskKey::new("15", "Kyiv"), Duration::from_secs(60));
    let guard = task.try_claim().unwrap();
    assert!(task.try_claim().is_none());
    drop(guard);
    assert!(task.try_claim().is_some());
}
