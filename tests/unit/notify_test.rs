//! Tests for notifier backends

use slot_poller::core::{Notification, Notifier};
use slot_poller::infra::{InMemoryNotifier, NtfyNotifier};
use std::time::Duration;

#[tokio::test]
async fn test_in_memory_notifier_records() {
    let notifier = InMemoryNotifier::new();
    notifier
        .notify(Notification::new("slots", "first").with_message("body"))
        .await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message, "body");
    assert_eq!(sent[0].effective_priority(), 3);
}

#[tokio::test]
async fn test_ntfy_delivery_failure_is_swallowed() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/slots")
        .with_status(500)
        .create_async()
        .await;

    let notifier = NtfyNotifier::new(&server.url(), Duration::from_secs(5)).unwrap();
    // Logged, never propagated.
    notifier
        .notify(Notification::new("slots", "Stop looking for exam slots!"))
        .await;

    mock.assert_async().await;
}

#[test]
fn test_ntfy_rejects_bad_server() {
    assert!(NtfyNotifier::new("::not a url::", Duration::from_secs(1)).is_err());
}

#[tokio::test]
async fn test_in_memory_notifier_concurrent_sends() {
    let notifier = InMemoryNotifier::new();
    let sends = (0..16).map(|i| notifier.notify(Notification::new("slots", format!("alert-{i}"))));
    futures::future::join_all(sends).await;

    assert_eq!(notifier.sent().len(), 16);
    assert_eq!(notifier.count_containing("alert-1"), 7);
}
