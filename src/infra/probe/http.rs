//! HTTP probe against the exam-queue web cabinet.
//!
//! One GET per check, authenticated with the session cookie. Availability and
//! session state are recognised by marker strings in the returned page.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use uuid::Uuid;

use super::SessionValidator;
use crate::config::{ExamType, PollerConfig};
use crate::core::{Credential, PollerError, Probe, ProbeError, ProbeOutcome, RefreshError, TaskKey};

/// Settings for [`HttpProbe`].
#[derive(Debug, Clone)]
pub struct HttpProbeConfig {
    /// Page to request.
    pub url: String,
    /// Cookie name carrying the credential.
    pub session_cookie: String,
    /// Text that only appears when the session is not authenticated.
    pub auth_marker: String,
    /// Text that only appears when slots are offered.
    pub slots_marker: String,
    /// Exam kind forwarded as a query parameter.
    pub exam_type: ExamType,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Where evidence pages are written.
    pub evidence_dir: PathBuf,
}

impl HttpProbeConfig {
    /// Settings taken from the poller configuration.
    #[must_use]
    pub fn from_config(cfg: &PollerConfig) -> Self {
        Self {
            url: cfg.probe_url.clone(),
            session_cookie: cfg.session_cookie.clone(),
            auth_marker: cfg.auth_marker.clone(),
            slots_marker: cfg.slots_marker.clone(),
            exam_type: cfg.exam_type,
            timeout: cfg.default_timeout(),
            evidence_dir: std::env::temp_dir(),
        }
    }
}

/// [`Probe`] and [`SessionValidator`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    url: Url,
    cfg: HttpProbeConfig,
}

impl HttpProbe {
    /// Build the probe.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::Config`] for an invalid URL or client settings.
    pub fn new(cfg: HttpProbeConfig) -> Result<Self, PollerError> {
        let url = Url::parse(&cfg.url)
            .map_err(|e| PollerError::Config(format!("invalid probe url `{}`: {e}", cfg.url)))?;
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| PollerError::Config(format!("can't build probe client: {e}")))?;
        Ok(Self { client, url, cfg })
    }

    fn task_url(&self, task: &TaskKey) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("date", &task.exam_date)
            .append_pair("address", &task.address)
            .append_pair("exam_type", self.cfg.exam_type.as_str());
        url
    }

    async fn fetch(&self, url: Url, credential: &Credential) -> Result<(StatusCode, String), ProbeError> {
        let cookie = format!("{}={}", self.cfg.session_cookie, credential.expose());
        let response = self
            .client
            .get(url)
            .header(COOKIE, cookie)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        Ok((status, body))
    }

    fn is_auth_page(&self, status: StatusCode, body: &str) -> bool {
        matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            || body.contains(&self.cfg.auth_marker)
    }

    async fn store_evidence(&self, body: &str) -> Result<PathBuf, ProbeError> {
        let path = self
            .cfg
            .evidence_dir
            .join(format!("slot-{}.html", Uuid::new_v4()));
        tokio::fs::write(&path, body).await?;
        Ok(path)
    }
}

fn transport(err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        ProbeError::Transport(format!("request timed out: {err}"))
    } else {
        ProbeError::Transport(err.to_string())
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, task: &TaskKey, credential: &Credential) -> Result<ProbeOutcome, ProbeError> {
        let (status, body) = self.fetch(self.task_url(task), credential).await?;

        if self.is_auth_page(status, &body) {
            return Ok(ProbeOutcome::AuthExpired);
        }
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }
        if body.contains(&self.cfg.slots_marker) {
            let evidence = self.store_evidence(&body).await?;
            debug!(path = %evidence.display(), "stored evidence");
            return Ok(ProbeOutcome::Available {
                evidence: Some(evidence),
            });
        }
        Ok(ProbeOutcome::NotAvailable)
    }
}

#[async_trait]
impl SessionValidator for HttpProbe {
    async fn validate(&self, credential: &Credential) -> Result<bool, RefreshError> {
        let (status, body) = self
            .fetch(self.url.clone(), credential)
            .await
            .map_err(|e| RefreshError::Session(e.to_string()))?;

        if self.is_auth_page(status, &body) {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(RefreshError::Session(format!("unexpected status {status}")));
        }
        Ok(true)
    }
}
