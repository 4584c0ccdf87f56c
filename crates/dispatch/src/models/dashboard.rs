//! Dashboard aggregates.

use chrono::{DateTime, Utc};
use serde::Serialize;

use outreach_core::{CustomerId, InteractionId};

/// How many tags the dashboard lists.
pub const TOP_TAG_LIMIT: i64 = 5;
/// How many interactions the activity feed shows.
pub const RECENT_ACTIVITY_LIMIT: i64 = 10;
/// Window for the "recent interactions" counter.
pub const RECENT_INTERACTION_DAYS: i64 = 7;

/// Summary numbers shown on the CRM dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_customers: i64,
    pub active_customers: i64,
    pub total_campaigns: i64,
    pub sent_campaigns: i64,
    /// Interactions logged within the last [`RECENT_INTERACTION_DAYS`] days.
    pub recent_interactions: i64,
    pub top_tags: Vec<TagCount>,
    pub recent_activity: Vec<ActivityEntry>,
}

/// A tag and how many customers carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// One line of the dashboard activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: InteractionId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub interaction_type: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
