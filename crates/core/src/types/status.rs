//! Status enums for CRM records.

use serde::{Deserialize, Serialize};

/// Whether a customer may receive campaign email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "customer_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
}

impl CustomerStatus {
    /// Only active customers are part of any campaign audience.
    #[must_use]
    pub const fn is_reachable(self) -> bool {
        matches!(self, Self::Active)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CustomerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("invalid customer status: {s}")),
        }
    }
}

/// Lifecycle of an email campaign.
///
/// `Sent` is terminal and is only ever reached through a dispatch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "campaign_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Scheduled,
    Sent,
    Paused,
}

impl CampaignStatus {
    /// Whether the campaign content and targeting may still change.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        !matches!(self, Self::Sent)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Sent => "sent",
            Self::Paused => "paused",
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "sent" => Ok(Self::Sent),
            "paused" => Ok(Self::Paused),
            _ => Err(format!("invalid campaign status: {s}")),
        }
    }
}

/// Interaction type recorded for every delivery attempt.
pub const INTERACTION_EMAIL_SENT: &str = "email_sent";

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_status_serde() {
        assert_eq!(
            serde_json::to_string(&CustomerStatus::Inactive).unwrap(),
            "\"inactive\""
        );
        let parsed: CustomerStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(parsed, CustomerStatus::Active);
    }

    #[test]
    fn test_only_active_is_reachable() {
        assert!(CustomerStatus::Active.is_reachable());
        assert!(!CustomerStatus::Inactive.is_reachable());
    }

    #[test]
    fn test_campaign_status_roundtrip_str() {
        for status in [
            CampaignStatus::Draft,
            CampaignStatus::Scheduled,
            CampaignStatus::Sent,
            CampaignStatus::Paused,
        ] {
            assert_eq!(status.as_str().parse::<CampaignStatus>().unwrap(), status);
        }
        assert!("archived".parse::<CampaignStatus>().is_err());
    }

    #[test]
    fn test_sent_campaigns_are_frozen() {
        assert!(CampaignStatus::Draft.is_editable());
        assert!(CampaignStatus::Paused.is_editable());
        assert!(!CampaignStatus::Sent.is_editable());
    }
}
