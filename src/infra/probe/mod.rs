//! Probe backends.

pub mod http;

use async_trait::async_trait;

use crate::core::{Credential, RefreshError};

pub use http::{HttpProbe, HttpProbeConfig};

/// Checks whether a credential still opens an authenticated session.
#[async_trait]
pub trait SessionValidator: Send + Sync + 'static {
    /// `Ok(false)` when the session is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::Session`] when the check itself fails.
    async fn validate(&self, credential: &Credential) -> Result<bool, RefreshError>;
}
