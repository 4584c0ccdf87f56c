//! Email campaigns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outreach_core::{CampaignId, CampaignStatus, UserId};

/// A stored email template plus targeting rule and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailCampaign {
    pub id: CampaignId,
    pub name: String,
    pub subject: String,
    /// Body template; may contain `{{first_name}}`-style placeholders.
    pub content: String,
    pub status: CampaignStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    /// Customers sharing any of these tags are targeted; empty means everyone active.
    pub target_tags: Vec<String>,
    /// Whether placeholders are substituted per recipient before sending.
    pub ai_personalized: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default)]
    pub target_tags: Vec<String>,
    #[serde(default)]
    pub ai_personalized: bool,
    #[serde(default)]
    pub created_by: Option<UserId>,
}

impl NewCampaign {
    /// Initial status: scheduled when a send time is given, draft otherwise.
    #[must_use]
    pub const fn initial_status(&self) -> CampaignStatus {
        if self.scheduled_for.is_some() {
            CampaignStatus::Scheduled
        } else {
            CampaignStatus::Draft
        }
    }
}

/// Partial update for a campaign that has not been sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignUpdate {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub status: Option<CampaignStatus>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub target_tags: Option<Vec<String>>,
    pub ai_personalized: Option<bool>,
}
