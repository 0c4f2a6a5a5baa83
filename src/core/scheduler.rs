//! Polling scheduler: owns the task set, the worker threads and the
//! distributor, and wires them to the probe, notifier and credential gate.
//!
//! # Lifecycle
//!
//! 1. Acquire the first credential (fatal on failure).
//! 2. Announce the watched dates and cities.
//! 3. Start `min(max_workers, tasks)` workers and the distributor.
//! 4. On shutdown the distributor closes the channel; workers drain what is
//!    already queued and exit.
//! 5. Announce the stop, or return the fatal error (credential failure or a
//!    panicked worker).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::bounded;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use super::credential::RefreshCoordinator;
use super::distributor::Distributor;
use super::error::PollerError;
use super::probe::{Notification, Notifier, Probe};
use super::shutdown::Shutdown;
use super::stats::{PollerCounters, PollerStats};
use super::task::TaskHandle;
use super::worker::{panic_message, spawn_worker, WorkerContext};
use crate::config::SchedulerOptions;
use crate::util::emoji;

/// Number of workers for `task_count` tasks under a `max_workers` ceiling.
#[must_use]
pub fn worker_count(max_workers: usize, task_count: usize) -> usize {
    max_workers.min(task_count)
}

/// Concurrent polling scheduler.
pub struct Scheduler {
    tasks: Arc<[TaskHandle]>,
    options: SchedulerOptions,
    ctx: Arc<WorkerContext>,
    started: AtomicBool,
}

impl Scheduler {
    /// Create a scheduler over `tasks`.
    pub fn new(
        tasks: Vec<TaskHandle>,
        options: SchedulerOptions,
        probe: Arc<dyn Probe>,
        notifier: Arc<dyn Notifier>,
        credentials: Arc<RefreshCoordinator>,
    ) -> Self {
        let ctx = WorkerContext {
            probe,
            notifier,
            credentials,
            counters: Arc::new(PollerCounters::default()),
            topic: options.topic.clone(),
            shutdown: Shutdown::new(),
            fatal: Mutex::new(None),
        };
        Self {
            tasks: tasks.into(),
            options,
            ctx: Arc::new(ctx),
            started: AtomicBool::new(false),
        }
    }

    /// Handle that stops the scheduler when triggered.
    #[must_use]
    pub fn shutdown_handle(&self) -> Shutdown {
        self.ctx.shutdown.clone()
    }

    /// Number of workers [`run`](Self::run) will start.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        worker_count(self.options.max_workers, self.tasks.len())
    }

    /// Tasks being polled.
    #[must_use]
    pub fn tasks(&self) -> &[TaskHandle] {
        &self.tasks
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> PollerStats {
        self.ctx.counters.snapshot(
            self.worker_count(),
            self.tasks.len(),
            self.ctx.credentials.refresh_count(),
        )
    }

    /// Run until shutdown is triggered or the credential becomes unavailable.
    ///
    /// Blocks the calling thread. Must not be called from inside an async
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::Refresh`] when the credential cannot be
    /// obtained, [`PollerError::Runtime`] when a worker panics, and
    /// [`PollerError::Runtime`] or [`PollerError::Io`] when threads or
    /// runtimes cannot be created.
    pub fn run(&self) -> Result<PollerStats, PollerError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(PollerError::Runtime("scheduler already started".into()));
        }
        self.options.validate().map_err(PollerError::Config)?;

        let workers = self.worker_count();
        if workers == 0 {
            warn!("no tasks to poll");
            return Ok(self.stats());
        }

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PollerError::Runtime(e.to_string()))?;

        self.ctx.credentials.current()?;

        rt.block_on(self.ctx.notifier.notify(self.start_notification()));
        info!(
            workers,
            tasks = self.tasks.len(),
            interval = ?self.options.interval,
            "start looking for exam slots"
        );

        let (tx, rx) = bounded::<TaskHandle>(self.tasks.len());
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            match spawn_worker(
                worker_id,
                rx.clone(),
                Arc::clone(&self.ctx),
                self.options.thread_stack_size,
            ) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!(worker_id, error = %e, "Failed to spawn worker thread");
                    self.ctx.shutdown.trigger();
                    drop(tx);
                    join_all(&self.ctx, handles);
                    return Err(e.into());
                }
            }
        }
        drop(rx);

        let distributor = Distributor::new(
            Arc::clone(&self.tasks),
            tx,
            self.options.interval,
            self.ctx.shutdown.receiver(),
            Arc::clone(&self.ctx.counters),
        )
        .spawn();
        let distributor = match distributor {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, "Failed to spawn distributor thread");
                self.ctx.shutdown.trigger();
                join_all(&self.ctx, handles);
                return Err(e.into());
            }
        };

        join_all(&self.ctx, handles);
        // Workers can also stop on their own (fatal error); make sure the
        // distributor follows.
        self.ctx.shutdown.trigger();
        if distributor.join().is_err() {
            error!("distributor thread panicked");
        }

        let stats = self.stats();
        if let Some(err) = self.ctx.fatal.lock().take() {
            error!(error = %err, ?stats, "poller stopped on fatal error");
            return Err(err);
        }

        rt.block_on(self.ctx.notifier.notify(Notification::new(
            &self.options.topic,
            "Stop looking for exam slots!",
        )));
        info!(?stats, "poller stopped");
        Ok(stats)
    }

    fn start_notification(&self) -> Notification {
        let mut dates: Vec<&str> = Vec::new();
        let mut cities: Vec<&str> = Vec::new();
        for task in self.tasks.iter() {
            let key = task.key();
            if !dates.contains(&key.exam_date.as_str()) {
                dates.push(&key.exam_date);
            }
            if !cities.contains(&key.address.as_str()) {
                cities.push(&key.address);
            }
        }

        Notification::new(
            &self.options.topic,
            format!("{} Start looking for exam slots!", emoji::LOUDSPEAKER),
        )
        .with_message(format!(
            "DATES: {}; CITIES: {}",
            dates.join(", "),
            cities.join(", ")
        ))
    }
}

/// Join every worker; a thread that died by panic is recorded as fatal.
fn join_all(ctx: &WorkerContext, handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(payload) = handle.join() {
            let reason = panic_message(payload.as_ref());
            error!(reason = %reason, "worker thread panicked");
            ctx.record_fatal(PollerError::Runtime(format!("worker thread panicked: {reason}")));
        }
    }
}
