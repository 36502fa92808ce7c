use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use super::{DeliveryReceipt, EmailMessage, MailError, Mailer};
use crate::config::MailConfig;

/// Mailer backed by the Resend HTTP API.
pub struct ResendMailer {
    client: Client,
    endpoint: String,
    api_key: String,
    from_address: String,
}

impl ResendMailer {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            from_address: from_address.into(),
        }
    }

    /// Builds a mailer from configuration, or `None` when no key is configured.
    pub fn from_config(client: Client, config: &MailConfig) -> Option<Self> {
        config.api_key.as_ref().map(|key| {
            Self::new(
                client,
                config.endpoint.clone(),
                key.clone(),
                config.from_address.clone(),
            )
        })
    }

    fn emails_url(&self) -> String {
        format!("{}/emails", self.endpoint)
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: EmailMessage) -> Result<DeliveryReceipt, MailError> {
        let request = SendEmailRequest {
            from: &self.from_address,
            to: [message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };

        let response = self
            .client
            .post(self.emails_url())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(DeliveryReceipt {
            provider_id: parsed.id,
        })
    }
}

/// Stand-in used when no provider key is configured. Every dispatch fails non-fatally.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, _message: EmailMessage) -> Result<DeliveryReceipt, MailError> {
        Err(MailError::NotConfigured)
    }
}
