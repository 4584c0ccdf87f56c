//! Data access used by the dispatch service.
//!
//! The dispatch path only needs a handful of reads and writes, so it talks to
//! the database through [`CrmStore`] rather than the repositories directly.
//! [`PgStore`] is the production implementation; tests use
//! `testing::MemoryStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use outreach_core::{CampaignId, CustomerId};

use crate::db::{CampaignRepository, CustomerRepository, InteractionRepository, RepositoryError};
use crate::models::{Customer, EmailCampaign, NewInteraction};

/// Reads and writes performed by campaign dispatch.
#[async_trait]
pub trait CrmStore: Send + Sync {
    /// Look up a customer by ID.
    async fn customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// Look up a campaign by ID.
    async fn campaign(&self, id: CampaignId) -> Result<Option<EmailCampaign>, RepositoryError>;

    /// Active customers matching `target_tags` (all active when empty).
    async fn audience(&self, target_tags: &[String]) -> Result<Vec<Customer>, RepositoryError>;

    /// Append an interaction log row.
    async fn record_interaction(&self, entry: NewInteraction) -> Result<(), RepositoryError>;

    /// Mark a campaign sent. Returns `false` if it no longer exists.
    async fn mark_campaign_sent(
        &self,
        id: CampaignId,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
}

/// `PostgreSQL`-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrmStore for PgStore {
    async fn customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        CustomerRepository::new(&self.pool).get(id).await
    }

    async fn campaign(&self, id: CampaignId) -> Result<Option<EmailCampaign>, RepositoryError> {
        CampaignRepository::new(&self.pool).get(id).await
    }

    async fn audience(&self, target_tags: &[String]) -> Result<Vec<Customer>, RepositoryError> {
        CustomerRepository::new(&self.pool).audience(target_tags).await
    }

    async fn record_interaction(&self, entry: NewInteraction) -> Result<(), RepositoryError> {
        InteractionRepository::new(&self.pool).insert(&entry).await?;
        Ok(())
    }

    async fn mark_campaign_sent(
        &self,
        id: CampaignId,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        CampaignRepository::new(&self.pool).mark_sent(id, sent_at).await
    }
}
