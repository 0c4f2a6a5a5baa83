//! Probe and notifier abstractions consumed by the workers.

use std::path::PathBuf;

use async_trait::async_trait;

use super::credential::Credential;
use super::error::ProbeError;
use super::task::TaskKey;

/// Outcome of one completed availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A slot is available; `evidence` points at a captured artifact if any.
    Available {
        /// Temporary file capturing what was seen.
        evidence: Option<PathBuf>,
    },
    /// The check completed and no slot is available.
    NotAvailable,
    /// The resource demands re-authentication.
    AuthExpired,
}

/// Performs one availability check for a task.
///
/// On native platforms, this is called from a dedicated worker thread with
/// its own single-threaded tokio runtime.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use slot_poller::core::{Credential, Probe, ProbeError, ProbeOutcome, TaskKey};
///
/// struct AlwaysEmpty;
///
/// #[async_trait]
/// impl Probe for AlwaysEmpty {
///     async fn probe(&self, _task: &TaskKey, _credential: &Credential) -> Result<ProbeOutcome, ProbeError> {
///         Ok(ProbeOutcome::NotAvailable)
///     }
/// }
/// ```
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    /// Check `task` using `credential`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the check could not be completed.
    async fn probe(&self, task: &TaskKey, credential: &Credential)
        -> Result<ProbeOutcome, ProbeError>;
}

/// An outbound alert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    /// Channel/topic the alert is published to.
    pub topic: String,
    /// Short headline.
    pub title: String,
    /// Optional tags.
    pub tags: Vec<String>,
    /// Body text; ignored when an attachment is sent.
    pub message: String,
    /// File sent as the alert body instead of `message`.
    pub attachment: Option<PathBuf>,
    /// Delivery priority, 1–5. Zero means the default (3).
    pub priority: u8,
}

impl Notification {
    /// Create a text notification for `topic`.
    pub fn new(topic: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the body text.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach a file.
    #[must_use]
    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(path.into());
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the delivery priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Priority with the default applied.
    #[must_use]
    pub const fn effective_priority(&self) -> u8 {
        if self.priority == 0 {
            3
        } else {
            self.priority
        }
    }
}

/// Best-effort alert delivery.
///
/// Implementations log delivery failures and never return them: a lost
/// alert must not stall polling.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Deliver `notification`.
    async fn notify(&self, notification: Notification);
}
