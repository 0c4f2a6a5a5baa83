//! Notifier backends.

pub mod memory;
pub mod ntfy;

pub use memory::InMemoryNotifier;
pub use ntfy::NtfyNotifier;
