//! Resend HTTP API mailer.
//!
//! - Endpoint: `POST {base_url}/emails`
//! - Authentication: `Authorization: Bearer <api key>`
//! - Body: `{from, to, subject, html}`; response `{id}`

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::mailer::{Delivery, Mailer, MailerError, OutboundEmail};
use crate::config::ResendConfig;

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Mailer backed by the Resend API.
#[derive(Clone)]
pub struct ResendMailer {
    inner: Arc<ResendMailerInner>,
}

struct ResendMailerInner {
    client: reqwest::Client,
    endpoint: String,
    from: String,
}

impl ResendMailer {
    /// Create a new Resend client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ResendConfig, from: &str) -> Result<Self, MailerError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| MailerError::Parse(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let endpoint = format!("{}/emails", config.base_url.as_str().trim_end_matches('/'));

        Ok(Self {
            inner: Arc::new(ResendMailerInner {
                client,
                endpoint,
                from: from.to_string(),
            }),
        })
    }

    /// Map a non-2xx response to a typed error.
    async fn parse_error(response: reqwest::Response) -> MailerError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return MailerError::RateLimited(retry_after);
        }

        if status == 401 || status == 403 {
            return MailerError::Unauthorized;
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        MailerError::Api { status, message }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    fn name(&self) -> &'static str {
        "resend"
    }

    #[instrument(skip(self, email), fields(to = %email.to))]
    async fn send(&self, email: &OutboundEmail) -> Result<Delivery, MailerError> {
        let body = SendEmailBody {
            from: &self.inner.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| MailerError::Parse(format!("Failed to parse response: {e}")))?;

        tracing::info!(id = %sent.id, "Email accepted by Resend");
        Ok(Delivery::accepted("Email sent", Some(sent.id)))
    }
}

impl std::fmt::Debug for ResendMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendMailer")
            .field("endpoint", &self.inner.endpoint)
            .field("from", &self.inner.from)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        http::{HeaderMap as AxumHeaders, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use secrecy::SecretString;
    use url::Url;

    use super::*;
    use outreach_core::Email;

    const TEST_KEY: &str = "re_test_4f9a2c7e1b8d6035";

    async fn fake_emails(
        headers: AxumHeaders,
        Json(body): Json<serde_json::Value>,
    ) -> impl IntoResponse {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {TEST_KEY}"));
        if !authorized {
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({}))).into_response();
        }
        match body["to"][0].as_str() {
            Some("slow@example.com") => {
                (StatusCode::TOO_MANY_REQUESTS, [("Retry-After", "7")], "slow down").into_response()
            }
            Some("bad@example.com") => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid recipient").into_response()
            }
            _ => Json(serde_json::json!({"id": "msg_123"})).into_response(),
        }
    }

    async fn spawn_fake_resend() -> Url {
        let app = Router::new().route("/emails", post(fake_emails));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        Url::parse(&format!("http://{addr}/")).expect("valid url")
    }

    fn mailer(base_url: Url, key: &str) -> ResendMailer {
        let config = ResendConfig {
            api_key: SecretString::from(key.to_string()),
            base_url,
        };
        ResendMailer::new(&config, "Outreach <hello@example.com>").expect("client builds")
    }

    fn email_to(to: &str) -> OutboundEmail {
        OutboundEmail {
            to: Email::parse(to).expect("valid email"),
            subject: "Hello".to_string(),
            html: "<p>Hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_returns_provider_id() {
        let base = spawn_fake_resend().await;
        let delivery = mailer(base, TEST_KEY)
            .send(&email_to("ada@example.com"))
            .await
            .expect("accepted");
        assert!(delivery.success);
        assert_eq!(delivery.id.as_deref(), Some("msg_123"));
    }

    #[tokio::test]
    async fn test_send_maps_error_statuses() {
        let base = spawn_fake_resend().await;

        let err = mailer(base.clone(), "re_wrong_key_0000000000")
            .send(&email_to("ada@example.com"))
            .await
            .expect_err("bad key");
        assert!(matches!(err, MailerError::Unauthorized));

        let client = mailer(base, TEST_KEY);
        let err = client
            .send(&email_to("slow@example.com"))
            .await
            .expect_err("rate limited");
        assert!(matches!(err, MailerError::RateLimited(7)));

        let err = client
            .send(&email_to("bad@example.com"))
            .await
            .expect_err("rejected");
        assert!(matches!(err, MailerError::Api { status: 422, .. }));
    }
}
