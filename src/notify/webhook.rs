//! Implements the `Notifier` trait against a Telegram-style bot API.

use crate::error::NotificationDeliveryError;
use crate::notify::{DeliveryResult, Notifier};
use crate::Result;
use anyhow::Context;
use std::fmt::{Debug, Formatter};
use std::time::Duration;
use tracing::trace;
use url::Url;

/// Sends each message as `GET {endpoint}/bot{token}/sendMessage?chat_id={chat_id}&text={text}`.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    chat_id: String,
}

impl WebhookNotifier {
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Url::parse(&endpoint)
            .with_context(|| format!("Invalid notification endpoint '{endpoint}'"))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// The full request URL with `text` encoded into the query string.
    fn url(&self, text: &str) -> std::result::Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("{}/bot{}/sendMessage", self.endpoint, self.token))?;
        url.query_pairs_mut()
            .append_pair("chat_id", &self.chat_id)
            .append_pair("text", text);
        Ok(url)
    }
}

// The token must never end up in logs.
impl Debug for WebhookNotifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("endpoint", &self.endpoint)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, text: &str) -> DeliveryResult {
        let url = self
            .url(text)
            .map_err(|e| NotificationDeliveryError(format!("unable to build the URL: {e}")))?;
        trace!("Sending notification to {}", self.endpoint);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NotificationDeliveryError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(NotificationDeliveryError(format!(
                "the channel responded with status {status}: {body}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves exactly one HTTP request with `status_line` and returns the request line it saw.
    async fn serve_once(status_line: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let body = "{}";
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            let request = String::from_utf8_lossy(&buf).to_string();
            request.lines().next().unwrap_or_default().to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_url_encodes_text() {
        let notifier =
            WebhookNotifier::new("https://bots.example.com/", "123:abc", "-42", Duration::from_secs(1))
                .unwrap();
        let url = notifier.url("line one\nline & two").unwrap();
        let s = url.as_str();
        assert!(s.starts_with("https://bots.example.com/bot123:abc/sendMessage?"));
        assert!(s.contains("chat_id=-42"));
        assert!(s.contains("%0A"));
        assert!(s.contains("%26"));
    }

    #[test]
    fn test_debug_hides_token() {
        let notifier =
            WebhookNotifier::new("https://bots.example.com", "secret-token", "1", Duration::from_secs(1))
                .unwrap();
        assert!(!format!("{notifier:?}").contains("secret-token"));
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(WebhookNotifier::new("not a url", "t", "1", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_send_success() {
        let (endpoint, server) = serve_once("HTTP/1.1 200 OK").await;
        let notifier = WebhookNotifier::new(endpoint, "tok", "99", Duration::from_secs(5)).unwrap();
        notifier.send("hi\nthere").await.unwrap();
        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /bottok/sendMessage?"));
        assert!(request_line.contains("chat_id=99"));
        assert!(request_line.contains("hi%0Athere"));
    }

    #[tokio::test]
    async fn test_send_error_status() {
        let (endpoint, server) = serve_once("HTTP/1.1 400 Bad Request").await;
        let notifier = WebhookNotifier::new(endpoint, "tok", "99", Duration::from_secs(5)).unwrap();
        let err = notifier.send("hi").await.unwrap_err();
        assert!(err.to_string().contains("400"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_unreachable() {
        // Bind then drop to get a port that is very likely closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let notifier =
            WebhookNotifier::new(format!("http://{addr}"), "tok", "1", Duration::from_secs(2))
                .unwrap();
        assert!(notifier.send("hi").await.is_err());
    }
}
