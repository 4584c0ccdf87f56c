//! In-memory test doubles for the dispatch path.
//!
//! Available under `cfg(test)` and to other crates through the `testing`
//! feature.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use outreach_core::{
    CampaignId, CampaignStatus, CustomerId, CustomerStatus, Email, resolve_audience,
};

use crate::db::RepositoryError;
use crate::models::{Customer, EmailCampaign, NewInteraction};
use crate::services::{Delivery, Mailer, MailerError, OutboundEmail};
use crate::store::CrmStore;

/// Build an active customer with the given email, first name and tags.
///
/// # Panics
///
/// Panics if `email` is not a valid address.
#[must_use]
pub fn customer(email: &str, first_name: Option<&str>, tags: &[&str]) -> Customer {
    let now = Utc::now();
    Customer {
        id: CustomerId::generate(),
        email: Email::parse(email).unwrap_or_else(|e| panic!("invalid test email {email}: {e}")),
        first_name: first_name.map(ToString::to_string),
        last_name: None,
        phone: None,
        company: None,
        status: CustomerStatus::Active,
        tags: tags.iter().map(ToString::to_string).collect(),
        metadata: serde_json::json!({}),
        created_at: now,
        updated_at: now,
    }
}

/// Build a draft campaign.
#[must_use]
pub fn campaign(
    name: &str,
    content: &str,
    target_tags: &[&str],
    ai_personalized: bool,
) -> EmailCampaign {
    let now = Utc::now();
    EmailCampaign {
        id: CampaignId::generate(),
        name: name.to_string(),
        subject: format!("{name} news"),
        content: content.to_string(),
        status: CampaignStatus::Draft,
        scheduled_for: None,
        sent_at: None,
        target_tags: target_tags.iter().map(ToString::to_string).collect(),
        ai_personalized,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

/// A [`CrmStore`] backed by vectors. Records every write for assertions.
#[derive(Default)]
pub struct MemoryStore {
    customers: RwLock<Vec<Customer>>,
    campaigns: RwLock<Vec<EmailCampaign>>,
    interactions: Mutex<Vec<NewInteraction>>,
    sent_marks: Mutex<Vec<CampaignId>>,
    fail_interactions: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_customer(self, customer: Customer) -> Self {
        self.customers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(customer);
        self
    }

    #[must_use]
    pub fn with_campaign(self, campaign: EmailCampaign) -> Self {
        self.campaigns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(campaign);
        self
    }

    /// Make every interaction insert fail.
    #[must_use]
    pub fn failing_interactions(mut self) -> Self {
        self.fail_interactions = true;
        self
    }

    /// Interactions recorded so far, in order.
    pub fn interactions(&self) -> Vec<NewInteraction> {
        self.interactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Campaign IDs passed to `mark_campaign_sent`, one entry per call.
    pub fn sent_marks(&self) -> Vec<CampaignId> {
        self.sent_marks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current state of a stored campaign.
    pub fn stored_campaign(&self, id: CampaignId) -> Option<EmailCampaign> {
        self.campaigns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }
}

#[async_trait]
impl CrmStore for MemoryStore {
    async fn customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().unwrap_or_else(PoisonError::into_inner);
        Ok(customers.iter().find(|c| c.id == id).cloned())
    }

    async fn campaign(&self, id: CampaignId) -> Result<Option<EmailCampaign>, RepositoryError> {
        Ok(self.stored_campaign(id))
    }

    async fn audience(&self, target_tags: &[String]) -> Result<Vec<Customer>, RepositoryError> {
        let customers = self.customers.read().unwrap_or_else(PoisonError::into_inner);
        Ok(resolve_audience(customers.as_slice(), target_tags)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn record_interaction(&self, entry: NewInteraction) -> Result<(), RepositoryError> {
        if self.fail_interactions {
            return Err(RepositoryError::DataCorruption(
                "interaction log unavailable".to_string(),
            ));
        }
        self.interactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        Ok(())
    }

    async fn mark_campaign_sent(
        &self,
        id: CampaignId,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        self.sent_marks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);

        let mut campaigns = self.campaigns.write().unwrap_or_else(PoisonError::into_inner);
        Ok(campaigns.iter_mut().find(|c| c.id == id).is_some_and(|c| {
            c.status = CampaignStatus::Sent;
            c.sent_at = Some(sent_at);
            true
        }))
    }
}

/// A [`Mailer`] that succeeds except for configured recipients.
#[derive(Default)]
pub struct ScriptedMailer {
    failing: HashSet<String>,
    sent: Mutex<Vec<OutboundEmail>>,
}

impl ScriptedMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message addressed to `email`.
    #[must_use]
    pub fn failing_for(mut self, email: &str) -> Self {
        self.failing.insert(email.to_string());
        self
    }

    /// Messages accepted so far, in order.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Mailer for ScriptedMailer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<Delivery, MailerError> {
        if self.failing.contains(email.to.as_str()) {
            return Err(MailerError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());
        Ok(Delivery::accepted("Email sent", Some(format!("test-{}", email.to))))
    }
}
