//! Outbound email through a transactional HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use warbler_config::EmailConfig;

pub const VERIFICATION_SUBJECT: &str = "Verification Code";
pub const LIKE_NOTIFICATION_SUBJECT: &str = "New like on your tweet";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email provider rejected message (status={status}): {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a plaintext email.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendEmailBody<'a> {
    sender: &'a BrevoEmailAddress,
    to: Vec<BrevoEmailAddress>,
    subject: &'a str,
    text_content: &'a str,
}

/// Sends through the Brevo `smtp/email` endpoint.
#[derive(Clone)]
pub struct BrevoEmailSender {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    sender: std::sync::Arc<BrevoEmailAddress>,
}

impl BrevoEmailSender {
    pub fn new(config: &EmailConfig, api_key: impl Into<String>) -> Result<Self, EmailError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds.max(1)))
            .user_agent(concat!("warbler/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let name = Some(config.sender_name.trim().to_string()).filter(|name| !name.is_empty());

        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: format!("{}/smtp/email", config.base_url.trim_end_matches('/')),
            sender: std::sync::Arc::new(BrevoEmailAddress {
                email: config.sender_email.clone(),
                name,
            }),
        })
    }
}

#[async_trait]
impl EmailSender for BrevoEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let payload = BrevoSendEmailBody {
            sender: &self.sender,
            to: vec![BrevoEmailAddress {
                email: to.to_string(),
                name: None,
            }],
            subject,
            text_content: body,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(to, subject, "email accepted by provider");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(EmailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Development sender used when no provider key is configured; writes the mail to the log.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        info!(to, subject, body, "email delivery disabled, logging message instead");
        Ok(())
    }
}
