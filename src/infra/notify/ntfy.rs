//! ntfy push notifier.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};
use tracing::{debug, error};

use crate::core::{AppResult, Notification, Notifier, PollerError};

/// Publishes notifications to an ntfy server.
///
/// Text alerts are POSTed to `<server>/<topic>`; alerts with an attachment are
/// PUT with the file as the body.
#[derive(Debug, Clone)]
pub struct NtfyNotifier {
    client: Client,
    server: Url,
}

impl NtfyNotifier {
    /// Create a notifier for `server` (e.g. `https://ntfy.sh`).
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::Config`] if the server URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(server: &str, timeout: Duration) -> Result<Self, PollerError> {
        let mut server = Url::parse(server)
            .map_err(|e| PollerError::Config(format!("invalid ntfy server `{server}`: {e}")))?;
        if !server.path().ends_with('/') {
            let path = format!("{}/", server.path());
            server.set_path(&path);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PollerError::Config(format!("can't build ntfy client: {e}")))?;
        Ok(Self { client, server })
    }

    /// Publishing URL for `topic`.
    pub fn topic_url(&self, topic: &str) -> AppResult<Url> {
        self.server
            .join(topic.trim_start_matches('/'))
            .with_context(|| format!("invalid ntfy topic `{topic}`"))
    }

    async fn send(&self, notification: &Notification) -> AppResult<()> {
        let url = self.topic_url(&notification.topic)?;

        let mut request = if let Some(path) = &notification.attachment {
            let body = tokio::fs::read(path)
                .await
                .with_context(|| format!("can't read attachment {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.client
                .put(url)
                .header("Filename", filename)
                .header(CONTENT_TYPE, content_type_for(path))
                .body(body)
        } else {
            self.client
                .post(url)
                .header(CONTENT_TYPE, "text/plain")
                .body(notification.message.clone())
        };

        // Titles carry emoji, which `HeaderValue::from_str` rejects.
        let title = HeaderValue::from_bytes(notification.title.as_bytes())
            .map_err(|e| anyhow!("invalid notification title: {e}"))?;
        request = request
            .header("Title", title)
            .header("Priority", notification.effective_priority().to_string());
        if !notification.tags.is_empty() {
            request = request.header("Tags", notification.tags.join(","));
        }

        let response = request.send().await.context("ntfy request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("ntfy responded {status}: {body}"));
        }
        debug!(topic = %notification.topic, title = %notification.title, "notification sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn notify(&self, notification: Notification) {
        if let Err(e) = self.send(&notification).await {
            error!(
                topic = %notification.topic,
                title = %notification.title,
                error = %e,
                "can't send notification"
            );
        }
    }
}

/// MIME type for an attachment, by extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("html" | "htm") => "text/html",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn notifier(server: &str) -> NtfyNotifier {
        NtfyNotifier::new(server, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("shot.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("/tmp/slot.html")), "text/html");
        assert_eq!(content_type_for(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn test_topic_url_keeps_server_path() {
        let n = notifier("https://push.example.com/ntfy");
        assert_eq!(
            n.topic_url("slots").unwrap().as_str(),
            "https://push.example.com/ntfy/slots"
        );
    }

    #[tokio::test]
    async fn test_text_notification_is_posted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/slots")
            .match_header("content-type", "text/plain")
            .match_header("priority", "4")
            .match_header("tags", "warning,key")
            .match_body("body text")
            .with_status(200)
            .create_async()
            .await;

        let n = notifier(&server.url());
        let notification = Notification::new("slots", "Authorization required!")
            .with_message("body text")
            .with_tags(["warning", "key"])
            .with_priority(4);
        n.send(&notification).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_attachment_is_put() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.html");
        std::fs::write(&path, "<html>slots</html>").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/slots")
            .match_header("filename", "slot.html")
            .match_header("content-type", "text/html")
            .match_header("priority", "3")
            .match_body(Matcher::Exact("<html>slots</html>".into()))
            .with_status(200)
            .create_async()
            .await;

        let n = notifier(&server.url());
        let notification = Notification::new("slots", "🎉 DATE: 15; CITY: Kyiv ").with_attachment(&path);
        n.send(&notification).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/slots")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let n = notifier(&server.url());
        let err = n
            .send(&Notification::new("slots", "title").with_message("x"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
