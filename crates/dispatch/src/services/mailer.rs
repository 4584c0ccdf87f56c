//! Outbound email delivery.
//!
//! [`Mailer`] is the seam between campaign dispatch and the delivery provider.
//! The concrete backend is chosen from [`EmailConfig`] by [`build_mailer`]:
//!
//! - [`ResendMailer`] when `RESEND_API_KEY` is set
//! - [`SmtpMailer`] when `SMTP_HOST` is set
//! - [`LogMailer`] otherwise (simulated delivery, nothing leaves the process)

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use outreach_core::Email;

use super::resend::ResendMailer;
use super::smtp::SmtpMailer;
use crate::config::{EmailConfig, EmailProvider};

/// Errors that can occur when handing an email to a provider.
#[derive(Debug, Error)]
pub enum MailerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the provider.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Provider rejected the API key.
    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    /// Failed to parse the provider response or build a request.
    #[error("Parse error: {0}")]
    Parse(String),

    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Failed to build the message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// A fully rendered message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: Email,
    pub subject: String,
    /// HTML body, already personalized.
    pub html: String,
}

/// What the provider said about an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub success: bool,
    pub message: String,
    /// Provider message ID, when the provider returns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Delivery {
    /// An accepted delivery.
    pub fn accepted(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id,
        }
    }
}

/// An email delivery backend.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Hand one message to the provider.
    async fn send(&self, email: &OutboundEmail) -> Result<Delivery, MailerError>;
}

/// Simulated delivery: logs the message and reports success.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

pub const SIMULATED_MESSAGE: &str = "Email sent (simulated)";

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<Delivery, MailerError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            bytes = email.html.len(),
            "Simulated email sent"
        );
        Ok(Delivery::accepted(SIMULATED_MESSAGE, None))
    }
}

/// Build the mailer selected by configuration.
///
/// # Errors
///
/// Returns `MailerError` if the provider client cannot be constructed.
pub fn build_mailer(config: &EmailConfig) -> Result<Arc<dyn Mailer>, MailerError> {
    let mailer: Arc<dyn Mailer> = match &config.provider {
        EmailProvider::Resend(resend) => {
            Arc::new(ResendMailer::new(resend, &config.from_address)?)
        }
        EmailProvider::Smtp(smtp) => Arc::new(SmtpMailer::new(smtp, &config.from_address)?),
        EmailProvider::Log => Arc::new(LogMailer),
    };
    tracing::info!(provider = mailer.name(), "Email delivery configured");
    Ok(mailer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_reports_simulated_success() {
        let email = OutboundEmail {
            to: Email::parse("ada@example.com").expect("valid email"),
            subject: "Hello".to_string(),
            html: "<p>Hi</p>".to_string(),
        };

        let delivery = LogMailer.send(&email).await.expect("log mailer never fails");
        assert!(delivery.success);
        assert_eq!(delivery.message, SIMULATED_MESSAGE);
        assert!(delivery.id.is_none());
    }

    #[test]
    fn test_delivery_omits_missing_id() {
        let json = serde_json::to_value(Delivery::accepted("ok", None)).expect("serializes");
        assert_eq!(json, serde_json::json!({"success": true, "message": "ok"}));
    }

    #[test]
    fn test_build_mailer_defaults_to_log() {
        let config = EmailConfig {
            from_address: "Outreach <hello@example.com>".to_string(),
            provider: EmailProvider::Log,
        };
        let mailer = build_mailer(&config).expect("log mailer builds");
        assert_eq!(mailer.name(), "log");
    }
}
