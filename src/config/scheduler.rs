//! Scheduler runtime options.

use std::time::Duration;

/// Options for [`Scheduler`](crate::core::Scheduler).
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Ceiling on concurrent workers; the actual count never exceeds the
    /// number of tasks.
    pub max_workers: usize,
    /// Pause between distribution passes.
    pub interval: Duration,
    /// Notification topic for lifecycle and found-slot alerts.
    pub topic: String,
    /// Stack size for worker threads, in bytes.
    pub thread_stack_size: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get(),
            interval: Duration::from_secs(60),
            topic: String::new(),
            thread_stack_size: 2 * 1024 * 1024,
        }
    }
}

impl SchedulerOptions {
    /// Options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker ceiling.
    #[must_use]
    pub const fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the distribution interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the notification topic.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Validate option values.
    pub fn validate(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("interval must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        Ok(())
    }
}
