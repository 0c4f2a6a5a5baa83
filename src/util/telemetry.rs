//! Telemetry helpers for structured logging and tracing.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level used when the configured one cannot be parsed.
pub const FALLBACK_LEVEL: Level = Level::DEBUG;

/// Parse a level name (`trace`, `debug`, `info`, `warn`, `error`), ignoring
/// case and surrounding whitespace.
#[must_use]
pub fn parse_level(level: &str) -> Option<Level> {
    level.trim().to_ascii_lowercase().parse().ok()
}

/// Initialize tracing/telemetry. `RUST_LOG` takes precedence over
/// `configured_level`; an unparseable level falls back to
/// [`FALLBACK_LEVEL`]. Does nothing if a subscriber is already installed.
///
/// Returns `true` when this call installed the subscriber.
pub fn init_tracing(configured_level: &str) -> bool {
    if tracing::dispatcher::has_been_set() {
        return false;
    }

    let parsed = parse_level(configured_level);
    let level = parsed.unwrap_or(FALLBACK_LEVEL);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .try_init()
        .is_ok();

    if installed {
        if parsed.is_none() {
            tracing::warn!(
                level = configured_level,
                "unsupported log level, falling back to {}",
                FALLBACK_LEVEL
            );
        }
        tracing::debug!("debug messages are enabled");
    }
    installed
}
