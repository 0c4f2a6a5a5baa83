//! Process-wide cancellation signal.
//!
//! Triggering drops the only sender of a zero-capacity channel, which makes
//! every clone of the receiver disconnect. The distributor selects on that
//! receiver; nothing else needs to observe it.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

/// Cloneable cancellation handle.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<Mutex<Option<Sender<()>>>>,
    rx: Receiver<()>,
}

impl Shutdown {
    /// Create an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
            rx,
        }
    }

    /// Fire the signal. Idempotent.
    pub fn trigger(&self) {
        self.tx.lock().take();
    }

    /// `true` once [`trigger`](Self::trigger) has been called.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.tx.lock().is_none()
    }

    /// Receiver that disconnects when the signal fires; use it in `select!`.
    #[must_use]
    pub fn receiver(&self) -> Receiver<()> {
        self.rx.clone()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
