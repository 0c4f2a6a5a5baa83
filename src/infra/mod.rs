//! Infrastructure adapters: HTTP probe, notifiers and credential storage.

pub mod credential;
pub mod notify;
pub mod probe;

pub use credential::FileRefresher;
pub use notify::{InMemoryNotifier, NtfyNotifier};
pub use probe::{HttpProbe, HttpProbeConfig, SessionValidator};
