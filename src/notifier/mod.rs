pub mod email;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, NotifierConfig};
use crate::error::Result;

pub use email::EmailNotifier;
pub use webhook::WebhookNotifier;

/// Delivers a rendered update. Transport and credentials are the implementor's business.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> Result<()>;
}

/// Writes the update to the log only. Default when no channel is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        info!(event = "NOTIFY", "{subject}\n{body}");
        Ok(())
    }
}

pub fn from_config(cfg: &Config) -> Result<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> = match &cfg.notifier {
        NotifierConfig::Log => Arc::new(LogNotifier),
        NotifierConfig::Email(email) => Arc::new(EmailNotifier::new(email.clone())?),
        NotifierConfig::Webhook(hook) => Arc::new(WebhookNotifier::new(hook.clone())?),
    };
    Ok(notifier)
}
