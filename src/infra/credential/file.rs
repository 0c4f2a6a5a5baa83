//! Credential refresher backed by a token file.
//!
//! The saved token is reused while the session accepts it. Otherwise the user
//! is alerted and the file is watched until a different, accepted token shows
//! up or the authorization deadline passes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::{Credential, CredentialRefresher, Notification, Notifier, RefreshError};
use crate::infra::probe::SessionValidator;
use crate::util::emoji;

/// Refreshes the credential from a file.
pub struct FileRefresher {
    path: PathBuf,
    validator: Arc<dyn SessionValidator>,
    notifier: Arc<dyn Notifier>,
    topic: String,
    auth_timeout: Duration,
    poll_interval: Duration,
}

impl FileRefresher {
    /// Create a refresher for `path`. Waits up to 10 minutes for
    /// re-authorization, checking the file every 5 seconds.
    pub fn new(
        path: impl Into<PathBuf>,
        validator: Arc<dyn SessionValidator>,
        notifier: Arc<dyn Notifier>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            validator,
            notifier,
            topic: topic.into(),
            auth_timeout: Duration::from_secs(600),
            poll_interval: Duration::from_secs(5),
        }
    }

    /// Set the authorization deadline.
    #[must_use]
    pub const fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Set how often the file is re-read while waiting.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Path of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn refresh_async(&self) -> Result<Credential, RefreshError> {
        let saved = read_credential(&self.path).await?;
        if self.validator.validate(&saved).await? {
            info!("saved token still valid");
            return Ok(saved);
        }

        warn!(path = %self.path.display(), "saved token rejected, authorization required");
        self.notifier
            .notify(
                Notification::new(
                    &self.topic,
                    format!("{}{} Authorization required!", emoji::WARNING, emoji::LOUDSPEAKER),
                )
                .with_message(format!(
                    "Put a fresh session token into {}",
                    self.path.display()
                ))
                .with_priority(4),
            )
            .await;

        tokio::time::timeout(self.auth_timeout, self.wait_for_new(&saved))
            .await
            .map_err(|_| RefreshError::Timeout(self.auth_timeout))
    }

    async fn wait_for_new(&self, rejected: &Credential) -> Credential {
        loop {
            tokio::time::sleep(self.poll_interval).await;

            let candidate = match read_credential(&self.path).await {
                Ok(c) if &c != rejected => c,
                Ok(_) => continue,
                Err(e) => {
                    debug!(error = %e, "credential file not ready");
                    continue;
                }
            };

            match self.validator.validate(&candidate).await {
                Ok(true) => {
                    info!("new token accepted");
                    return candidate;
                }
                Ok(false) => debug!("new token rejected, still waiting"),
                Err(e) => warn!(error = %e, "can't validate new token"),
            }
        }
    }
}

impl CredentialRefresher for FileRefresher {
    fn refresh(&self) -> Result<Credential, RefreshError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RefreshError::Session(format!("can't create runtime: {e}")))?;
        rt.block_on(self.refresh_async())
    }
}

async fn read_credential(path: &Path) -> Result<Credential, RefreshError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RefreshError::ReadCredential {
            path: path.to_path_buf(),
            source,
        })?;
    let token = raw.trim();
    if token.is_empty() {
        return Err(RefreshError::EmptyCredential(path.to_path_buf()));
    }
    Ok(Credential::new(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::notify::InMemoryNotifier;
    use async_trait::async_trait;

    /// Accepts exactly one token.
    struct AcceptOnly(&'static str);

    #[async_trait]
    impl SessionValidator for AcceptOnly {
        async fn validate(&self, credential: &Credential) -> Result<bool, RefreshError> {
            Ok(credential.expose() == self.0)
        }
    }

    fn refresher(path: &Path, accept: &'static str, notifier: &InMemoryNotifier) -> FileRefresher {
        FileRefresher::new(path, Arc::new(AcceptOnly(accept)), Arc::new(notifier.clone()), "slots")
            .with_auth_timeout(Duration::from_secs(2))
            .with_poll_interval(Duration::from_millis(20))
    }

    #[test]
    fn test_valid_saved_token_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.txt");
        std::fs::write(&path, "  good\n").unwrap();
        let notifier = InMemoryNotifier::new();

        let credential = refresher(&path, "good", &notifier).refresh().unwrap();

        assert_eq!(credential.expose(), "good");
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = InMemoryNotifier::new();

        let err = refresher(&dir.path().join("nope.txt"), "good", &notifier)
            .refresh()
            .unwrap_err();
        assert!(matches!(err, RefreshError::ReadCredential { .. }));
    }

    #[test]
    fn test_empty_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.txt");
        std::fs::write(&path, " \n").unwrap();
        let notifier = InMemoryNotifier::new();

        let err = refresher(&path, "good", &notifier).refresh().unwrap_err();
        assert!(matches!(err, RefreshError::EmptyCredential(_)));
    }

    #[test]
    fn test_waits_for_new_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.txt");
        std::fs::write(&path, "stale").unwrap();
        let notifier = InMemoryNotifier::new();

        let writer_path = path.clone();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            std::fs::write(writer_path, "fresh").unwrap();
        });

        let credential = refresher(&path, "fresh", &notifier).refresh().unwrap();
        writer.join().unwrap();

        assert_eq!(credential.expose(), "fresh");
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].title.contains("Authorization required!"));
        assert_eq!(sent[0].priority, 4);
    }

    #[test]
    fn test_times_out_without_new_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.txt");
        std::fs::write(&path, "stale").unwrap();
        let notifier = InMemoryNotifier::new();

        let err = refresher(&path, "fresh", &notifier)
            .with_auth_timeout(Duration::from_millis(100))
            .refresh()
            .unwrap_err();
        assert!(matches!(err, RefreshError::Timeout(_)));
    }
}
