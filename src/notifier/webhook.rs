use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::WebhookConfig;
use crate::error::{AppError, Result};
use crate::notifier::Notifier;

/// Posts the update to a chat webhook as JSON.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    body: &'a str,
    /// Subject and body in one field, for hooks that only read `text`.
    text: String,
}

impl WebhookNotifier {
    pub fn new(cfg: WebhookConfig) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, url: cfg.url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let payload = WebhookPayload {
            subject,
            body,
            text: format!("{subject}\n{body}"),
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Notify(format!("webhook returned {status}: {text}")));
        }

        info!("Webhook message sent");
        Ok(())
    }
}
