//! Release log delivery by email.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DeliveryError;
use crate::request::{is_valid_email, shorten_sha};

pub use http::HttpMailer;

/// Revision characters shown in the subject line.
const SUBJECT_REVISION_LEN: usize = 7;

/// An outgoing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl EmailMessage {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self, DeliveryError> {
        let to = to.into();
        if !is_valid_email(&to) {
            return Err(DeliveryError::InvalidRecipient(to));
        }
        Ok(Self {
            from: from.into(),
            to,
            subject: subject.into(),
            text: text.into(),
        })
    }
}

/// What the delivery stage reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub recipient: String,
    pub subject: String,
    pub delivered: bool,
    /// Set by mailers that only preview the message.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Sends a message somewhere.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sender address used for outgoing messages.
    fn sender(&self) -> &str;

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, DeliveryError>;
}

/// `"🚀 Release Log: {repo} ({from}→{to})"` with revisions cut to 7 characters.
pub fn subject_line(repository: &str, from_revision: &str, to_revision: &str) -> String {
    format!(
        "🚀 Release Log: {} ({}→{})",
        repository,
        shorten_sha(from_revision, SUBJECT_REVISION_LEN),
        shorten_sha(to_revision, SUBJECT_REVISION_LEN)
    )
}

/// Mailer that prints the message to stderr instead of sending it.
#[derive(Debug, Clone)]
pub struct DryRunMailer {
    from: String,
}

impl DryRunMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

impl Default for DryRunMailer {
    fn default() -> Self {
        Self::new("releasecast@localhost")
    }
}

#[async_trait]
impl Mailer for DryRunMailer {
    fn sender(&self) -> &str {
        &self.from
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        info!("Dry run: not sending email to {}", message.to);
        eprintln!(
            "From: {}\nTo: {}\nSubject: {}\n\n{}",
            message.from, message.to, message.subject, message.text
        );

        Ok(DeliveryReceipt {
            recipient: message.to.clone(),
            subject: message.subject.clone(),
            delivered: false,
            dry_run: true,
            message_id: None,
        })
    }
}
