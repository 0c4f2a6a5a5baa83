//! Unit tests for individual components

mod builders_test;
mod config_test;
mod error_test;
mod notify_test;
mod task_test;
