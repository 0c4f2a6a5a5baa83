//! Shared utilities.

pub mod emoji;
pub mod telemetry;

pub use telemetry::*;
