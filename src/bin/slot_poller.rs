//! slot-poller: watches the exam queue for free slots and pushes alerts.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use slot_poller::builders::build_scheduler;
use slot_poller::config::PollerConfig;
use slot_poller::core::{AppResult, Notification, Notifier, Shutdown};
use slot_poller::infra::NtfyNotifier;
use slot_poller::util::{emoji, init_tracing};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "slot-poller", about = "Poll for free exam slots and send ntfy alerts")]
struct Cli {
    /// JSON configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            init_tracing("info");
            error!(error = %e, "poller failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> AppResult<()> {
    let mut cfg = PollerConfig::load(&cli.config)?;
    if let Some(level) = cli.log_level {
        cfg.log_level = level;
    }
    init_tracing(&cfg.log_level);

    let control = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("poll-control")
        .enable_all()
        .build()?;

    let notifier = Arc::new(NtfyNotifier::new(&cfg.ntfy_server, cfg.default_timeout())?);
    let scheduler = build_scheduler(&cfg, notifier.clone())?;

    let shutdown = scheduler.shutdown_handle();
    control.spawn(stop_on_signal(shutdown));

    match scheduler.run() {
        Ok(stats) => {
            info!(?stats, "bye");
            Ok(())
        }
        Err(e) => {
            control.block_on(
                notifier.notify(
                    Notification::new(
                        &cfg.ntfy_topic,
                        format!("{}{} Something went wrong", emoji::WARNING, emoji::FACEPALM),
                    )
                    .with_message(e.to_string()),
                ),
            );
            Err(e.into())
        }
    }
}

async fn stop_on_signal(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "can't listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "can't listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown requested, draining queued tasks");
    shutdown.trigger();
}
