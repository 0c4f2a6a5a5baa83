//! Builders to construct the task set and the scheduler from configuration.

pub mod poller_builder;
pub mod task_builder;

pub use poller_builder::build_scheduler;
pub use task_builder::build_tasks;
