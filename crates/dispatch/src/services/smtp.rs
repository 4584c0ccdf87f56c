//! SMTP mailer via lettre.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret;
use tracing::instrument;

use super::mailer::{Delivery, Mailer, MailerError, OutboundEmail};
use crate::config::SmtpConfig;

/// Mailer that relays HTML messages over authenticated STARTTLS SMTP.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Create a new SMTP mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the sender address is invalid or the relay cannot be
    /// configured.
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self, MailerError> {
        let from: Mailbox = from
            .parse()
            .map_err(|_| MailerError::InvalidAddress(from.to_string()))?;

        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self { transport, from })
    }

    fn build_message(&self, email: &OutboundEmail) -> Result<Message, MailerError> {
        let to: Mailbox = email
            .to
            .as_str()
            .parse()
            .map_err(|_| MailerError::InvalidAddress(email.to.to_string()))?;

        Ok(Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())?)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &'static str {
        "smtp"
    }

    #[instrument(skip(self, email), fields(to = %email.to))]
    async fn send(&self, email: &OutboundEmail) -> Result<Delivery, MailerError> {
        let message = self.build_message(email)?;
        let response = self.transport.send(message).await?;

        let id = response.message().next().map(ToString::to_string);
        tracing::info!(subject = %email.subject, "Email sent successfully");
        Ok(Delivery::accepted("Email sent", id))
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use outreach_core::Email;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: SecretString::from("hunter2-but-longer".to_string()),
        }
    }

    #[test]
    fn test_rejects_invalid_sender() {
        let err = SmtpMailer::new(&config(), "not an address").expect_err("invalid sender");
        assert!(matches!(err, MailerError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_builds_html_message() {
        let mailer = SmtpMailer::new(&config(), "Outreach <hello@example.com>").expect("builds");
        let message = mailer
            .build_message(&OutboundEmail {
                to: Email::parse("ada@example.com").expect("valid email"),
                subject: "Spring sale".to_string(),
                html: "<p>Hi Ada</p>".to_string(),
            })
            .expect("message builds");

        let raw = String::from_utf8(message.formatted()).expect("utf8");
        assert!(raw.contains("Subject: Spring sale"));
        assert!(raw.contains("To: ada@example.com"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("<p>Hi Ada</p>"));
    }
}
