//! Outbound email plumbing and the notification audit log.
//!
//! Dispatch failures never abort the operation that requested them. Callers record the
//! outcome (a `notification_sent` flag or a log entry) and move on.

pub mod log;
pub mod resend;
pub mod templates;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use log::{LogEntry, LogEntryId, NotificationKind, NotificationLog, NotificationOutcome};
pub use resend::{ResendMailer, UnconfiguredMailer};

/// Rendered email ready for the transactional provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub provider_id: String,
}

/// Transactional email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<DeliveryReceipt, MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("email delivery is not configured")]
    NotConfigured,
    #[error("email transport failed: {0}")]
    Transport(String),
    #[error("email provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Sends `message`, logging a warning on failure. Returns the receipt when delivered.
pub async fn dispatch(
    mailer: &dyn Mailer,
    message: EmailMessage,
    context: &str,
) -> Result<DeliveryReceipt, MailError> {
    let recipient = message.to.clone();
    match mailer.send(message).await {
        Ok(receipt) => {
            tracing::info!(
                context,
                recipient = %recipient,
                provider_id = %receipt.provider_id,
                "email dispatched"
            );
            Ok(receipt)
        }
        Err(error) => {
            tracing::warn!(context, recipient = %recipient, %error, "email dispatch failed");
            Err(error)
        }
    }
}
