//! Dashboard aggregate queries.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use outreach_core::{CustomerId, InteractionId};

use super::RepositoryError;
use crate::models::customer::display_name;
use crate::models::dashboard::{RECENT_ACTIVITY_LIMIT, RECENT_INTERACTION_DAYS, TOP_TAG_LIMIT};
use crate::models::{ActivityEntry, DashboardStats, TagCount};

#[derive(Debug, sqlx::FromRow)]
struct CountsRow {
    total_customers: i64,
    active_customers: i64,
    total_campaigns: i64,
    sent_campaigns: i64,
    recent_interactions: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    customer_id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    interaction_type: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityEntry {
    fn from(row: ActivityRow) -> Self {
        let customer_name = display_name(
            row.first_name.as_deref(),
            row.last_name.as_deref(),
            row.email.as_deref().unwrap_or("unknown customer"),
        );
        Self {
            id: InteractionId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            customer_name,
            customer_email: row.email,
            interaction_type: row.interaction_type,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// Read-only aggregates for the CRM dashboard.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Compute the dashboard summary as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn stats(&self, now: DateTime<Utc>) -> Result<DashboardStats, RepositoryError> {
        let since = now - Duration::days(RECENT_INTERACTION_DAYS);

        let counts = sqlx::query_as::<_, CountsRow>(
            "SELECT \
                 (SELECT COUNT(*) FROM customers) AS total_customers, \
                 (SELECT COUNT(*) FROM customers WHERE status = 'active') AS active_customers, \
                 (SELECT COUNT(*) FROM email_campaigns) AS total_campaigns, \
                 (SELECT COUNT(*) FROM email_campaigns WHERE status = 'sent') AS sent_campaigns, \
                 (SELECT COUNT(*) FROM customer_interactions WHERE created_at >= $1) \
                     AS recent_interactions",
        )
        .bind(since)
        .fetch_one(self.pool)
        .await?;

        let top_tags = sqlx::query_as::<_, TagCount>(
            "SELECT tag, COUNT(*) AS count \
             FROM customers, UNNEST(tags) AS tag \
             GROUP BY tag \
             ORDER BY count DESC, tag ASC \
             LIMIT $1",
        )
        .bind(TOP_TAG_LIMIT)
        .fetch_all(self.pool)
        .await?;

        let recent_activity = sqlx::query_as::<_, ActivityRow>(
            "SELECT i.id, i.customer_id, c.first_name, c.last_name, c.email, \
                    i.interaction_type, i.description, i.created_at \
             FROM customer_interactions i \
             LEFT JOIN customers c ON c.id = i.customer_id \
             ORDER BY i.created_at DESC \
             LIMIT $1",
        )
        .bind(RECENT_ACTIVITY_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(DashboardStats {
            total_customers: counts.total_customers,
            active_customers: counts.active_customers,
            total_campaigns: counts.total_campaigns,
            sent_campaigns: counts.sent_campaigns,
            recent_interactions: counts.recent_interactions,
            top_tags,
            recent_activity: recent_activity.into_iter().map(Into::into).collect(),
        })
    }
}
