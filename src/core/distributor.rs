//! Task distributor: keeps a steady cadence of probe opportunities.
//!
//! Pushes the whole task list into the shared channel once at start and then
//! on every tick, until the shutdown signal fires. Dropping the sender at the
//! end closes the channel, which is how workers learn to drain and exit.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, tick, Receiver, Sender};
use tracing::{debug, info, warn};

use super::stats::PollerCounters;
use super::task::TaskHandle;

pub(crate) struct Distributor {
    tasks: Arc<[TaskHandle]>,
    tx: Sender<TaskHandle>,
    interval: Duration,
    cancel: Receiver<()>,
    counters: Arc<PollerCounters>,
}

impl Distributor {
    pub(crate) const fn new(
        tasks: Arc<[TaskHandle]>,
        tx: Sender<TaskHandle>,
        interval: Duration,
        cancel: Receiver<()>,
        counters: Arc<PollerCounters>,
    ) -> Self {
        Self {
            tasks,
            tx,
            interval,
            cancel,
            counters,
        }
    }

    /// Run on a dedicated thread.
    pub(crate) fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("poll-distributor".into())
            .spawn(move || self.run())
    }

    /// Seed, then re-seed on every tick until cancelled. Consumes `self` so
    /// the sender is dropped on return.
    pub(crate) fn run(self) {
        if !self.seed() {
            info!("task distribution stopped during initial burst");
            return;
        }

        let ticker = tick(self.interval);
        loop {
            select! {
                recv(self.cancel) -> _ => {
                    info!("close task channel. Application shutdown...");
                    break;
                }
                recv(ticker) -> _ => {
                    if !self.seed() {
                        break;
                    }
                }
            }
        }
    }

    /// Push every task once. Returns `false` when cancelled mid-pass or when
    /// no worker is left to receive.
    fn seed(&self) -> bool {
        for task in self.tasks.iter() {
            select! {
                send(self.tx, Arc::clone(task)) -> res => {
                    if res.is_err() {
                        warn!("all workers exited, stopping distribution");
                        return false;
                    }
                }
                recv(self.cancel) -> _ => {
                    info!("close task channel. Application shutdown...");
                    return false;
                }
            }
        }
        PollerCounters::incr(&self.counters.distributions);
        debug!(tasks = self.tasks.len(), "task list distributed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shutdown::Shutdown;
    use crate::core::task::{PollTask, TaskKey};
    use crossbeam_channel::bounded;
    use std::sync::atomic::Ordering;

    fn tasks(n: usize) -> Arc<[TaskHandle]> {
        (0..n)
            .map(|i| PollTask::handle(TaskKey::new(i.to_string(), "Kyiv"), Duration::from_secs(60)))
            .collect()
    }

    #[test]
    fn test_initial_burst_then_close_on_cancel() {
        let tasks = tasks(3);
        let (tx, rx) = bounded(tasks.len());
        let shutdown = Shutdown::new();
        let counters = Arc::new(PollerCounters::default());

        let handle = Distributor::new(
            Arc::clone(&tasks),
            tx,
            Duration::from_secs(3600),
            shutdown.receiver(),
            Arc::clone(&counters),
        )
        .spawn()
        .unwrap();

        let first: Vec<_> = (0..3).map(|_| rx.recv().unwrap()).collect();
        assert_eq!(first.len(), 3);
        assert!(Arc::ptr_eq(&first[0], &tasks[0]));

        shutdown.trigger();
        handle.join().unwrap();

        // Closed and drained.
        assert!(rx.recv().is_err());
        assert_eq!(counters.distributions.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_reseeds_every_tick() {
        let tasks = tasks(2);
        let (tx, rx) = bounded(tasks.len());
        let shutdown = Shutdown::new();
        let counters = Arc::new(PollerCounters::default());

        let handle = Distributor::new(
            tasks,
            tx,
            Duration::from_millis(20),
            shutdown.receiver(),
            Arc::clone(&counters),
        )
        .spawn()
        .unwrap();

        // Initial burst plus two ticks.
        for _ in 0..6 {
            rx.recv_timeout(Duration::from_secs(2)).unwrap();
        }

        shutdown.trigger();
        handle.join().unwrap();
        assert!(counters.distributions.load(Ordering::Relaxed) >= 3);
    }

    #[test]
    fn test_cancel_unblocks_full_channel() {
        let tasks = tasks(4);
        // Capacity below the task count: the burst blocks with nobody reading.
        let (tx, rx) = bounded(1);
        let shutdown = Shutdown::new();

        let handle = Distributor::new(
            tasks,
            tx,
            Duration::from_secs(3600),
            shutdown.receiver(),
            Arc::new(PollerCounters::default()),
        )
        .spawn()
        .unwrap();

        thread::sleep(Duration::from_millis(20));
        shutdown.trigger();
        handle.join().unwrap();

        assert_eq!(rx.iter().count(), 1);
    }

    #[test]
    fn test_stops_when_receivers_dropped() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let shutdown = Shutdown::new();

        Distributor::new(
            tasks(2),
            tx,
            Duration::from_secs(3600),
            shutdown.receiver(),
            Arc::new(PollerCounters::default()),
        )
        .run();
    }
}
