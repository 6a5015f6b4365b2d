use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::EmailConfig;
use crate::error::{AppError, Result};
use crate::notifier::Notifier;

/// SMTP with STARTTLS. The body is sent as preformatted HTML so line layout survives mail clients.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl EmailNotifier {
    pub fn new(cfg: EmailConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
            .map_err(|e| AppError::Config(format!("SMTP relay {}: {e}", cfg.smtp_host)))?
            .port(cfg.smtp_port)
            .credentials(Credentials::new(cfg.username, cfg.password))
            .build();

        let from = parse_mailbox(&cfg.from)?;
        let recipients = cfg
            .recipients
            .iter()
            .map(|r| parse_mailbox(r))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            transport,
            from,
            recipients,
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| AppError::Config(format!("invalid mail address '{address}': {e}")))
}

/// Minimal escaping for embedding plain text in `<pre>`.
pub fn html_body(body: &str) -> String {
    let escaped = body
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!("<pre>{escaped}</pre>")
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for to in &self.recipients {
            builder = builder.to(to.clone());
        }
        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(html_body(body))
            .map_err(|e| AppError::Notify(format!("failed to build mail: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Notify(format!("SMTP send failed: {e}")))?;

        info!(recipients = self.recipients.len(), "Mail sent");
        Ok(())
    }
}
