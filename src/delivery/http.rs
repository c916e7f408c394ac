//! Mail delivery through an HTTP mail API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::DeliveryError;
use crate::request::is_valid_email;

use super::{DeliveryReceipt, EmailMessage, Mailer};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts messages as JSON `{from, to, subject, text}` to a mail API endpoint.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    token: Option<String>,
    from: String,
}

/// Fields some mail APIs return on acceptance.
#[derive(Deserialize)]
struct AcceptedResponse {
    #[serde(alias = "message_id", alias = "messageId")]
    id: Option<String>,
}

impl HttpMailer {
    pub fn new(
        endpoint: impl Into<String>,
        from: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, DeliveryError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(DeliveryError::NotConfigured("mail endpoint is empty".to_string()));
        }
        let from = from.into();
        if !is_valid_email(&from) {
            return Err(DeliveryError::NotConfigured(format!(
                "sender address '{}' is not a valid email",
                from
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DeliveryError::Transport)?;

        Ok(Self {
            client,
            endpoint,
            token,
            from,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    fn sender(&self) -> &str {
        &self.from
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        debug!("Posting message for {} to {}", message.to, self.endpoint);

        let mut request = self.client.post(&self.endpoint).json(message);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(DeliveryError::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(DeliveryError::Transport)?;

        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let message_id = serde_json::from_str::<AcceptedResponse>(&body)
            .ok()
            .and_then(|r| r.id);

        info!("Email sent to {}", message.to);

        Ok(DeliveryReceipt {
            recipient: message.to.clone(),
            subject: message.subject.clone(),
            delivered: true,
            dry_run: false,
            message_id,
        })
    }
}
