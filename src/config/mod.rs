//! Configuration models for the poller and its scheduler.

pub mod poller;
pub mod scheduler;

pub use poller::{split_list, ExamType, PollerConfig};
pub use scheduler::SchedulerOptions;
