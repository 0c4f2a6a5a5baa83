//! In-memory notifier for development/testing.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{Notification, Notifier};

/// Records every notification instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications recorded so far, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    /// Titles recorded so far, in send order.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.sent.lock().iter().map(|n| n.title.clone()).collect()
    }

    /// Number of recorded notifications whose title contains `needle`.
    #[must_use]
    pub fn count_containing(&self, needle: &str) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|n| n.title.contains(needle))
            .count()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(&self, notification: Notification) {
        self.sent.lock().push(notification);
    }
}
