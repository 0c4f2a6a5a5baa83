//! Builder wiring the default collaborators into a scheduler.

use std::sync::Arc;

use crate::config::PollerConfig;
use crate::core::{Notifier, PollerError, RefreshCoordinator, Scheduler};
use crate::infra::{FileRefresher, HttpProbe, HttpProbeConfig};

use super::task_builder::build_tasks;

/// Build a scheduler from configuration, using the HTTP probe and the file
/// credential refresher. `notifier` receives every alert.
///
/// # Errors
///
/// Returns [`PollerError::Config`] if the configuration is invalid.
pub fn build_scheduler(
    cfg: &PollerConfig,
    notifier: Arc<dyn Notifier>,
) -> Result<Scheduler, PollerError> {
    cfg.validate()
        .map_err(|e| PollerError::Config(format!("config invalid: {e}")))?;

    let probe = Arc::new(HttpProbe::new(HttpProbeConfig::from_config(cfg))?);
    let refresher = FileRefresher::new(
        &cfg.credential_file,
        probe.clone(),
        Arc::clone(&notifier),
        &cfg.ntfy_topic,
    )
    .with_auth_timeout(cfg.auth_timeout())
    .with_poll_interval(cfg.auth_poll_interval());
    let credentials = Arc::new(RefreshCoordinator::new(Arc::new(refresher)));

    let tasks = build_tasks(&cfg.exam_dates, &cfg.addresses, cfg.ttl_for_found_task());

    Ok(Scheduler::new(
        tasks,
        cfg.scheduler_options(),
        probe,
        notifier,
        credentials,
    ))
}
