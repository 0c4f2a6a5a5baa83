//! Credential refresher backends.

pub mod file;

pub use file::FileRefresher;
