//! Email campaign repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use outreach_core::{CampaignId, CampaignStatus, UserId, normalize_tags};

use super::RepositoryError;
use crate::models::{CampaignUpdate, EmailCampaign, NewCampaign};

const CAMPAIGN_COLUMNS: &str = "id, name, subject, content, status, scheduled_for, sent_at, \
                                target_tags, ai_personalized, created_by, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct CampaignRow {
    id: Uuid,
    name: String,
    subject: String,
    content: String,
    status: CampaignStatus,
    scheduled_for: Option<DateTime<Utc>>,
    sent_at: Option<DateTime<Utc>>,
    target_tags: Vec<String>,
    ai_personalized: bool,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CampaignRow> for EmailCampaign {
    fn from(row: CampaignRow) -> Self {
        Self {
            id: CampaignId::new(row.id),
            name: row.name,
            subject: row.subject,
            content: row.content,
            status: row.status,
            scheduled_for: row.scheduled_for,
            sent_at: row.sent_at,
            target_tags: row.target_tags,
            ai_personalized: row.ai_personalized,
            created_by: row.created_by.map(UserId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Outcome of a guarded campaign update.
#[derive(Debug)]
pub enum CampaignPatch {
    Updated(EmailCampaign),
    /// The campaign exists but has already been sent.
    Locked,
    Missing,
}

/// Repository for campaign database operations.
pub struct CampaignRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CampaignRepository<'a> {
    /// Create a new campaign repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List campaigns, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<EmailCampaign>, RepositoryError> {
        let sql =
            format!("SELECT {CAMPAIGN_COLUMNS} FROM email_campaigns ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, CampaignRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a campaign by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CampaignId) -> Result<Option<EmailCampaign>, RepositoryError> {
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM email_campaigns WHERE id = $1");
        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a new campaign as draft, or as scheduled when a send time is set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &NewCampaign) -> Result<EmailCampaign, RepositoryError> {
        let sql = format!(
            "INSERT INTO email_campaigns \
                 (id, name, subject, content, status, scheduled_for, target_tags, \
                  ai_personalized, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {CAMPAIGN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(CampaignId::generate())
            .bind(input.name.trim())
            .bind(&input.subject)
            .bind(&input.content)
            .bind(input.initial_status())
            .bind(input.scheduled_for)
            .bind(normalize_tags(&input.target_tags))
            .bind(input.ai_personalized)
            .bind(input.created_by)
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }

    /// Apply a partial update to a campaign that has not been sent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: CampaignId,
        update: &CampaignUpdate,
    ) -> Result<CampaignPatch, RepositoryError> {
        let sql = format!(
            "UPDATE email_campaigns SET \
                 name = COALESCE($2, name), \
                 subject = COALESCE($3, subject), \
                 content = COALESCE($4, content), \
                 status = COALESCE($5, status), \
                 scheduled_for = COALESCE($6, scheduled_for), \
                 target_tags = COALESCE($7, target_tags), \
                 ai_personalized = COALESCE($8, ai_personalized), \
                 updated_at = NOW() \
             WHERE id = $1 AND status <> 'sent' \
             RETURNING {CAMPAIGN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(id)
            .bind(update.name.as_deref().map(str::trim))
            .bind(update.subject.as_deref())
            .bind(update.content.as_deref())
            .bind(update.status)
            .bind(update.scheduled_for)
            .bind(update.target_tags.as_ref().map(normalize_tags))
            .bind(update.ai_personalized)
            .fetch_optional(self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(CampaignPatch::Updated(row.into()));
        }

        // Distinguish "already sent" from "does not exist".
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM email_campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(if exists.is_some() {
            CampaignPatch::Locked
        } else {
            CampaignPatch::Missing
        })
    }

    /// Delete a campaign.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row was deleted.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: CampaignId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM email_campaigns WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set status to `sent` and stamp `sent_at`.
    ///
    /// Returns `false` if the campaign no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_sent(
        &self,
        id: CampaignId,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE email_campaigns \
             SET status = 'sent', sent_at = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(sent_at)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
