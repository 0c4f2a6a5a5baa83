//! Shared session credential and the single-flight refresh gate.
//!
//! All workers read the credential through a [`RefreshCoordinator`]. When a
//! probe reports an expired session, the worker asks the coordinator to
//! refresh *after the generation it used*. The first caller runs the refresh
//! sequence; callers arriving while it runs block on a `Condvar` and receive
//! its result; callers whose generation is already outdated get the newer
//! credential right away. Once a refresh completes the gate is open again, so
//! a later expiry triggers exactly one more refresh.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info};

use super::error::RefreshError;

/// Session token shared by all probes. Cheap to clone, redacted in `Debug`.
#[derive(Clone)]
pub struct Credential(Arc<SecretString>);

impl Credential {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::from(token.into())))
    }

    /// Raw token value, for building requests only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

/// Runs the (blocking, possibly interactive) credential acquisition sequence.
pub trait CredentialRefresher: Send + Sync + 'static {
    /// Obtain a valid credential.
    ///
    /// # Errors
    ///
    /// Any error is fatal: the coordinator enters its failed state.
    fn refresh(&self) -> Result<Credential, RefreshError>;
}

/// A credential together with the refresh generation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialLease {
    /// The credential.
    pub credential: Credential,
    /// Number of completed refreshes when it was produced.
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Refreshing,
    Failed(String),
}

struct GateState {
    credential: Option<Credential>,
    generation: u64,
    phase: Phase,
}

impl GateState {
    fn lease(&self) -> Option<CredentialLease> {
        self.credential.clone().map(|credential| CredentialLease {
            credential,
            generation: self.generation,
        })
    }
}

/// Single-flight, resettable credential refresh gate.
pub struct RefreshCoordinator {
    state: Mutex<GateState>,
    cond: Condvar,
    refresher: Arc<dyn CredentialRefresher>,
    refreshes: AtomicU64,
}

impl RefreshCoordinator {
    /// Create a coordinator with no credential yet; the first
    /// [`current`](Self::current) call acquires one.
    pub fn new(refresher: Arc<dyn CredentialRefresher>) -> Self {
        Self {
            state: Mutex::new(GateState {
                credential: None,
                generation: 0,
                phase: Phase::Idle,
            }),
            cond: Condvar::new(),
            refresher,
            refreshes: AtomicU64::new(0),
        }
    }

    /// Create a coordinator seeded with a known credential (generation 1).
    pub fn with_credential(refresher: Arc<dyn CredentialRefresher>, credential: Credential) -> Self {
        let coordinator = Self::new(refresher);
        {
            let mut state = coordinator.state.lock();
            state.credential = Some(credential);
            state.generation = 1;
        }
        coordinator
    }

    /// Current credential, acquiring the first one if none exists yet.
    ///
    /// While a refresh is running this returns the previous credential.
    ///
    /// # Errors
    ///
    /// Returns the failure of an earlier refresh, or of the initial
    /// acquisition.
    pub fn current(&self) -> Result<CredentialLease, RefreshError> {
        {
            let state = self.state.lock();
            if let Phase::Failed(msg) = &state.phase {
                return Err(RefreshError::Failed(msg.clone()));
            }
            if let Some(lease) = state.lease() {
                return Ok(lease);
            }
        }
        self.refresh_after(0)
    }

    /// Refresh the credential unless a refresh newer than `observed` already
    /// completed.
    ///
    /// Blocks while another caller's refresh is in flight and returns its
    /// result.
    ///
    /// # Errors
    ///
    /// Returns the refresher's error to the leading caller, and
    /// [`RefreshError::Failed`] to everyone else once the gate has failed.
    pub fn refresh_after(&self, observed: u64) -> Result<CredentialLease, RefreshError> {
        let mut state = self.state.lock();
        loop {
            match &state.phase {
                Phase::Failed(msg) => return Err(RefreshError::Failed(msg.clone())),
                Phase::Refreshing => {
                    debug!(observed, "waiting for in-flight credential refresh");
                    self.cond.wait(&mut state);
                }
                Phase::Idle => {
                    if state.generation > observed {
                        if let Some(lease) = state.lease() {
                            debug!(
                                observed,
                                generation = lease.generation,
                                "credential already refreshed"
                            );
                            return Ok(lease);
                        }
                    }
                    break;
                }
            }
        }

        state.phase = Phase::Refreshing;
        drop(state);

        let guard = PanicGuard { coordinator: self };
        let refresh_no = self.refreshes.fetch_add(1, Ordering::Relaxed) + 1;
        info!(refresh_no, observed, "refreshing credential");
        let result = self.refresher.refresh();
        std::mem::forget(guard);

        let mut state = self.state.lock();
        let outcome = match result {
            Ok(credential) => {
                state.credential = Some(credential.clone());
                state.generation += 1;
                state.phase = Phase::Idle;
                info!(generation = state.generation, "credential refreshed");
                Ok(CredentialLease {
                    credential,
                    generation: state.generation,
                })
            }
            Err(e) => {
                error!(error = %e, "credential refresh failed");
                state.phase = Phase::Failed(e.to_string());
                Err(e)
            }
        };
        self.cond.notify_all();
        outcome
    }

    /// Number of refresh sequences started so far.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Generation of the current credential (0 before the first one).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// `true` once a refresh has failed.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        matches!(self.state.lock().phase, Phase::Failed(_))
    }
}

/// Fails the gate if the refresher panics, so waiters are not parked forever.
struct PanicGuard<'a> {
    coordinator: &'a RefreshCoordinator,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.coordinator.state.lock();
        state.phase = Phase::Failed("credential refresher panicked".into());
        self.coordinator.cond.notify_all();
    }
}
