//! Poll tasks and their per-task result cache.
//!
//! A task is identified by an immutable `(exam_date, address)` key. Its
//! mutable [`TaskState`] sits behind a per-task lock so that only one worker
//! can act on it at a time, even though the distributor puts the same task
//! into the channel on every tick.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};

/// Immutable task identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    /// Exam date as shown by the external resource (e.g. `"15"`).
    pub exam_date: String,
    /// Service center address fragment.
    pub address: String,
}

impl TaskKey {
    /// Create a key, trimming surrounding whitespace from both parts.
    pub fn new(exam_date: impl AsRef<str>, address: impl AsRef<str>) -> Self {
        Self {
            exam_date: exam_date.as_ref().trim().to_string(),
            address: address.as_ref().trim().to_string(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DATE: {}; CITY: {}", self.exam_date, self.address)
    }
}

/// Result cache for one task.
#[derive(Debug, Clone)]
pub struct TaskState {
    /// Whether the last completed probe found a slot.
    pub found: bool,
    /// When the last success was confirmed.
    pub updated_at: Option<Instant>,
    /// How long a success suppresses re-probing.
    pub ttl: Duration,
}

impl TaskState {
    /// Fresh state: nothing found yet.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            found: false,
            updated_at: None,
            ttl,
        }
    }

    /// `true` when a success was confirmed less than `ttl` before `now`.
    #[must_use]
    pub fn is_fresh(&self, now: Instant) -> bool {
        match (self.found, self.updated_at) {
            (true, Some(at)) => now.saturating_duration_since(at) < self.ttl,
            _ => false,
        }
    }

    /// Clear the found flag ahead of a new probe.
    pub fn reset(&mut self) {
        self.found = false;
    }

    /// Record a confirmed success at `now`.
    pub fn mark_found(&mut self, now: Instant) {
        self.found = true;
        self.updated_at = Some(now);
    }
}

/// A task as shared between the distributor and the workers.
#[derive(Debug)]
pub struct PollTask {
    key: TaskKey,
    state: Mutex<TaskState>,
}

/// Cheap, cloneable handle passed through the task channel.
pub type TaskHandle = Arc<PollTask>;

impl PollTask {
    /// Create a task with an empty result cache.
    #[must_use]
    pub fn new(key: TaskKey, ttl: Duration) -> Self {
        Self {
            key,
            state: Mutex::new(TaskState::new(ttl)),
        }
    }

    /// Create a shareable handle.
    #[must_use]
    pub fn handle(key: TaskKey, ttl: Duration) -> TaskHandle {
        Arc::new(Self::new(key, ttl))
    }

    /// Task identity.
    #[must_use]
    pub const fn key(&self) -> &TaskKey {
        &self.key
    }

    /// Claim exclusive ownership of the task state.
    ///
    /// Returns `None` when another worker is currently processing the task.
    pub fn try_claim(&self) -> Option<MutexGuard<'_, TaskState>> {
        self.state.try_lock()
    }

    /// Snapshot of the current state. Blocks while a worker holds the task.
    #[must_use]
    pub fn snapshot(&self) -> TaskState {
        self.state.lock().clone()
    }
}
