//! Campaign dispatch: the `send-automated-email` function.
//!
//! A request either names one customer plus a literal subject and body
//! ("single mode"), or names a stored campaign ("campaign mode"). Each
//! delivery attempt is logged as an `email_sent` interaction. Recipients are
//! processed one at a time; there is no queue and no retry.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

use outreach_core::{
    CampaignId, CampaignStatus, CustomerId, INTERACTION_EMAIL_SENT, personalize,
};

use super::mailer::{Delivery, Mailer, MailerError, OutboundEmail};
use crate::db::RepositoryError;
use crate::models::{Customer, EmailCampaign, NewInteraction};
use crate::store::CrmStore;

pub const INVALID_REQUEST_MESSAGE: &str =
    "Invalid request. Provide campaignId or (customerId + subject + content)";

/// Errors returned by the dispatch service.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Neither a complete single-send nor a campaign ID was supplied.
    #[error("Invalid request. Provide campaignId or (customerId + subject + content)")]
    InvalidRequest,

    /// An ID field is not a valid UUID.
    #[error("Invalid {0}")]
    InvalidId(&'static str),

    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Campaign not found")]
    CampaignNotFound,

    /// The campaign's audience resolved to nobody.
    #[error("No customers found for campaign")]
    EmptyAudience,

    /// Delivery failed in single mode.
    #[error("email delivery failed: {0}")]
    Mailer(#[from] MailerError),

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

// =============================================================================
// Wire types
// =============================================================================

/// Request body of `POST /functions/v1/send-automated-email`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "useAI", alias = "useAi")]
    pub use_ai: Option<bool>,
}

/// A validated dispatch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchCommand {
    Single {
        customer_id: CustomerId,
        subject: String,
        content: String,
        personalize: bool,
    },
    Campaign {
        campaign_id: CampaignId,
    },
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

impl TryFrom<SendEmailRequest> for DispatchCommand {
    type Error = DispatchError;

    /// Single mode wins when customer, subject and content are all present;
    /// otherwise a campaign ID selects campaign mode.
    fn try_from(req: SendEmailRequest) -> Result<Self, Self::Error> {
        if let (Some(customer_id), Some(subject), Some(content)) = (
            present(req.customer_id.as_ref()),
            present(req.subject.as_ref()),
            present(req.content.as_ref()),
        ) {
            return Ok(Self::Single {
                customer_id: customer_id
                    .parse()
                    .map_err(|_| DispatchError::InvalidId("customerId"))?,
                subject: subject.to_string(),
                content: content.to_string(),
                personalize: req.use_ai.unwrap_or(false),
            });
        }

        if let Some(campaign_id) = present(req.campaign_id.as_ref()) {
            return Ok(Self::Campaign {
                campaign_id: campaign_id
                    .parse()
                    .map_err(|_| DispatchError::InvalidId("campaignId"))?,
            });
        }

        Err(DispatchError::InvalidRequest)
    }
}

/// Per-recipient outcome in campaign mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientStatus {
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientResult {
    /// Recipient email address.
    pub customer: String,
    pub status: RecipientStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleSendResponse {
    pub success: bool,
    pub message: String,
    pub email_result: Delivery,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignSendResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<RecipientResult>,
}

impl CampaignSendResponse {
    /// Number of recipients whose delivery failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == RecipientStatus::Failed)
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DispatchResponse {
    Single(SingleSendResponse),
    Campaign(CampaignSendResponse),
}

// =============================================================================
// Service
// =============================================================================

/// Runs dispatch requests against a store and a mailer.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn CrmStore>,
    mailer: Arc<dyn Mailer>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(store: Arc<dyn CrmStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Validate and run a raw request.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`].
    pub async fn handle(
        &self,
        request: SendEmailRequest,
    ) -> Result<DispatchResponse, DispatchError> {
        match DispatchCommand::try_from(request)? {
            DispatchCommand::Single {
                customer_id,
                subject,
                content,
                personalize,
            } => self
                .send_single(customer_id, &subject, &content, personalize)
                .await
                .map(DispatchResponse::Single),
            DispatchCommand::Campaign { campaign_id } => self
                .send_campaign(campaign_id)
                .await
                .map(DispatchResponse::Campaign),
        }
    }

    /// Send one literal email to one customer.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound` if the customer does not exist, `Mailer` if
    /// the provider rejects the message (no interaction is logged then), and
    /// `Store` on lookup failure.
    #[instrument(skip_all, fields(customer_id = %customer_id))]
    pub async fn send_single(
        &self,
        customer_id: CustomerId,
        subject: &str,
        content: &str,
        personalize_body: bool,
    ) -> Result<SingleSendResponse, DispatchError> {
        let customer = self
            .store
            .customer(customer_id)
            .await?
            .ok_or(DispatchError::CustomerNotFound)?;

        let email = render(&customer, subject, content, personalize_body);
        let delivery = self.mailer.send(&email).await?;

        self.log_interaction(NewInteraction {
            customer_id: customer.id,
            interaction_type: INTERACTION_EMAIL_SENT.to_string(),
            description: format!("Sent email: {subject}"),
            metadata: json!({ "subject": subject, "ai_personalized": personalize_body }),
        })
        .await;

        tracing::info!(to = %customer.email, "Single email sent");
        Ok(SingleSendResponse {
            success: true,
            message: "Email sent".to_string(),
            email_result: delivery,
        })
    }

    /// Send a stored campaign to its audience and mark it sent.
    ///
    /// Individual delivery failures are recorded as `failed` and do not stop
    /// the run. The campaign is marked sent once, after the loop, even when
    /// every recipient failed.
    ///
    /// # Errors
    ///
    /// Returns `CampaignNotFound`, `EmptyAudience`, or `Store` when a lookup
    /// or the final status update fails.
    #[instrument(skip_all, fields(campaign_id = %campaign_id))]
    pub async fn send_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<CampaignSendResponse, DispatchError> {
        let campaign = self
            .store
            .campaign(campaign_id)
            .await?
            .ok_or(DispatchError::CampaignNotFound)?;

        if campaign.status == CampaignStatus::Sent {
            tracing::warn!(sent_at = ?campaign.sent_at, "Campaign was already sent; sending again");
        }

        let audience = self.store.audience(&campaign.target_tags).await?;
        if audience.is_empty() {
            return Err(DispatchError::EmptyAudience);
        }

        let mut results = Vec::with_capacity(audience.len());
        for customer in &audience {
            let status = self.deliver(&campaign, customer).await;
            results.push(RecipientResult {
                customer: customer.email.to_string(),
                status,
            });

            self.log_interaction(NewInteraction {
                customer_id: customer.id,
                interaction_type: INTERACTION_EMAIL_SENT.to_string(),
                description: format!("Campaign: {}", campaign.name),
                metadata: json!({ "campaign_id": campaign.id, "subject": campaign.subject }),
            })
            .await;
        }

        if !self.store.mark_campaign_sent(campaign.id, Utc::now()).await? {
            tracing::warn!("Campaign disappeared before it could be marked sent");
        }

        let response = CampaignSendResponse {
            success: true,
            message: format!("Sent {} emails", results.len()),
            results,
        };
        tracing::info!(
            recipients = response.results.len(),
            failed = response.failed(),
            "Campaign dispatched"
        );
        Ok(response)
    }

    async fn deliver(&self, campaign: &EmailCampaign, customer: &Customer) -> RecipientStatus {
        let email = render(
            customer,
            &campaign.subject,
            &campaign.content,
            campaign.ai_personalized,
        );
        match self.mailer.send(&email).await {
            Ok(_) => RecipientStatus::Sent,
            Err(e) => {
                tracing::warn!(to = %customer.email, error = %e, "Campaign delivery failed");
                RecipientStatus::Failed
            }
        }
    }

    /// Interaction logging is best effort; a failed insert never fails a send.
    async fn log_interaction(&self, entry: NewInteraction) {
        let customer_id = entry.customer_id;
        if let Err(e) = self.store.record_interaction(entry).await {
            tracing::warn!(customer_id = %customer_id, error = %e, "Failed to log interaction");
        }
    }
}

fn render(
    customer: &Customer,
    subject: &str,
    content: &str,
    personalize_body: bool,
) -> OutboundEmail {
    let html = if personalize_body {
        personalize(content, &customer.recipient())
    } else {
        content.to_string()
    };
    OutboundEmail {
        to: customer.email.clone(),
        subject: subject.to_string(),
        html,
    }
}
