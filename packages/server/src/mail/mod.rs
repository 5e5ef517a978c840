use std::sync::Arc;

use anyhow::{Context, Result};

mod smtp;
pub mod templates;

pub use smtp::SmtpMailClient;

use crate::config::MailConfig;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
}

#[async_trait::async_trait]
pub trait MailClient: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;
}

pub type DynMailClient = Arc<dyn MailClient>;

/// Used when mail is disabled: messages are logged, never delivered.
pub struct LogMailClient;

#[async_trait::async_trait]
impl MailClient for LogMailClient {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        tracing::info!(to = %message.to, subject = %message.subject, "Mail disabled, not sending");
        Ok(())
    }
}

pub fn create_mail_client(config: &MailConfig) -> Result<DynMailClient> {
    if !config.enabled {
        return Ok(Arc::new(LogMailClient));
    }
    let smtp = config
        .smtp
        .as_ref()
        .context("mail.smtp settings required when mail is enabled")?;
    Ok(Arc::new(SmtpMailClient::new(config, smtp)?))
}

/// Send `message` on a background task.
///
/// Delivery failures are logged and otherwise ignored; callers have already
/// committed whatever the email is about.
pub fn send_in_background(mailer: &DynMailClient, message: EmailMessage) {
    let mailer = mailer.clone();
    tokio::spawn(async move {
        let to = message.to.clone();
        let subject = message.subject.clone();
        if let Err(e) = mailer.send(message).await {
            tracing::warn!(%to, %subject, "Failed to send email: {:#}", e);
        }
    });
}
