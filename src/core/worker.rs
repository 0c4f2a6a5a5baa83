//! Worker agent: pulls tasks off the shared channel until it is closed and
//! drained.
//!
//! Each worker is a dedicated OS thread with its own single-threaded tokio
//! runtime for the async collaborators (probe, notifier). The credential gate
//! is a blocking primitive and is called outside of `block_on`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::credential::RefreshCoordinator;
use super::error::{PollerError, ProbeError, RefreshError};
use super::probe::{Notification, Notifier, Probe, ProbeOutcome};
use super::shutdown::Shutdown;
use super::stats::PollerCounters;
use super::task::{PollTask, TaskHandle};
use crate::util::emoji;

/// Everything a worker needs, shared by all workers.
pub(crate) struct WorkerContext {
    pub probe: Arc<dyn Probe>,
    pub notifier: Arc<dyn Notifier>,
    pub credentials: Arc<RefreshCoordinator>,
    pub counters: Arc<PollerCounters>,
    pub topic: String,
    pub shutdown: Shutdown,
    pub fatal: Mutex<Option<PollerError>>,
}

impl WorkerContext {
    /// Keep the first fatal error and ask the distributor to stop.
    pub(crate) fn record_fatal(&self, err: PollerError) {
        {
            let mut slot = self.fatal.lock();
            if slot.is_none() {
                *slot = Some(err);
            }
        }
        self.shutdown.trigger();
    }
}

/// Spawn a worker thread.
pub(crate) fn spawn_worker(
    worker_id: usize,
    task_rx: Receiver<TaskHandle>,
    ctx: Arc<WorkerContext>,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("poll-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id, "Worker thread started");

            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!(worker_id, error = %e, "Failed to create worker runtime");
                    ctx.record_fatal(PollerError::Runtime(e.to_string()));
                    return;
                }
            };

            let worker = Worker {
                id: worker_id,
                ctx: &ctx,
                rt: &rt,
            };

            // Ends once the distributor dropped the sender and the queue is empty.
            for task in &task_rx {
                match panic::catch_unwind(AssertUnwindSafe(|| worker.process(&task))) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!(worker_id, error = %e, "credential unavailable, worker stopping");
                        ctx.record_fatal(e.into());
                        break;
                    }
                    Err(payload) => {
                        let reason = panic_message(payload.as_ref());
                        let key = task.key();
                        error!(
                            worker_id,
                            date = %key.exam_date,
                            address = %key.address,
                            reason = %reason,
                            "worker panicked, stopping poller"
                        );
                        ctx.record_fatal(PollerError::Runtime(format!(
                            "worker {worker_id} panicked: {reason}"
                        )));
                        break;
                    }
                }
            }

            debug!(worker_id, "Worker thread exiting");
        })
}

/// Text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}

struct Worker<'a> {
    id: usize,
    ctx: &'a WorkerContext,
    rt: &'a tokio::runtime::Runtime,
}

impl Worker<'_> {
    /// Handle one delivery of a task. Only credential failures are returned;
    /// a panicking collaborator unwinds to the worker loop.
    fn process(&self, task: &PollTask) -> Result<(), RefreshError> {
        let key = task.key();
        let counters = &self.ctx.counters;

        let Some(mut state) = task.try_claim() else {
            debug!(
                worker_id = self.id,
                date = %key.exam_date,
                address = %key.address,
                "task in flight on another worker"
            );
            PollerCounters::incr(&counters.skipped_in_flight);
            return Ok(());
        };

        if state.is_fresh(Instant::now()) {
            debug!(
                worker_id = self.id,
                date = %key.exam_date,
                address = %key.address,
                "task result not expired"
            );
            PollerCounters::incr(&counters.skipped_fresh);
            return Ok(());
        }

        state.reset();
        let mut lease = self.ctx.credentials.current()?;
        let mut refreshed = false;

        loop {
            PollerCounters::incr(&counters.probes);
            let outcome = self
                .rt
                .block_on(self.ctx.probe.probe(key, &lease.credential));

            match outcome {
                Ok(ProbeOutcome::AuthExpired) if refreshed => {
                    PollerCounters::incr(&counters.auth_expired);
                    PollerCounters::incr(&counters.probe_errors);
                    error!(
                        worker_id = self.id,
                        date = %key.exam_date,
                        address = %key.address,
                        error = %ProbeError::AuthRejected,
                        "probe failed"
                    );
                    return Ok(());
                }
                Ok(ProbeOutcome::AuthExpired) => {
                    PollerCounters::incr(&counters.auth_expired);
                    info!(
                        worker_id = self.id,
                        generation = lease.generation,
                        "authorization required, refreshing credential"
                    );
                    lease = self.ctx.credentials.refresh_after(lease.generation)?;
                    refreshed = true;
                }
                Ok(ProbeOutcome::Available { evidence }) => {
                    state.mark_found(Instant::now());
                    PollerCounters::incr(&counters.found);

                    let title = format!("{} {key} ", emoji::TADA);
                    let mut notification = Notification::new(&self.ctx.topic, &title);
                    if let Some(path) = &evidence {
                        notification = notification.with_attachment(path);
                    } else {
                        notification = notification.with_message(&title);
                    }
                    self.rt.block_on(self.ctx.notifier.notify(notification));

                    if let Some(path) = evidence {
                        if let Err(e) = std::fs::remove_file(&path) {
                            warn!(path = %path.display(), error = %e, "can't remove evidence file");
                        }
                    }
                    info!(worker_id = self.id, info = %title, "found time slot");
                    return Ok(());
                }
                Ok(ProbeOutcome::NotAvailable) => {
                    PollerCounters::incr(&counters.not_available);
                    info!(
                        worker_id = self.id,
                        date = %key.exam_date,
                        address = %key.address,
                        "can't find time slots"
                    );
                    return Ok(());
                }
                Err(e) => {
                    PollerCounters::incr(&counters.probe_errors);
                    error!(
                        worker_id = self.id,
                        date = %key.exam_date,
                        address = %key.address,
                        error = %e,
                        "probe failed"
                    );
                    return Ok(());
                }
            }
        }
    }
}
