//! Customer interaction log repository.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use outreach_core::{CustomerId, InteractionId};

use super::RepositoryError;
use crate::models::{CustomerInteraction, NewInteraction};

#[derive(Debug, sqlx::FromRow)]
struct InteractionRow {
    id: Uuid,
    customer_id: Uuid,
    interaction_type: String,
    description: String,
    metadata: JsonValue,
    created_at: DateTime<Utc>,
}

impl From<InteractionRow> for CustomerInteraction {
    fn from(row: InteractionRow) -> Self {
        Self {
            id: InteractionId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            interaction_type: row.interaction_type,
            description: row.description,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}

/// Repository for the append-only interaction log.
pub struct InteractionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InteractionRepository<'a> {
    /// Create a new interaction repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append one interaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including a
    /// dangling customer reference).
    pub async fn insert(
        &self,
        entry: &NewInteraction,
    ) -> Result<CustomerInteraction, RepositoryError> {
        let row = sqlx::query_as::<_, InteractionRow>(
            "INSERT INTO customer_interactions \
                 (id, customer_id, interaction_type, description, metadata) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, customer_id, interaction_type, description, metadata, created_at",
        )
        .bind(InteractionId::generate())
        .bind(entry.customer_id)
        .bind(&entry.interaction_type)
        .bind(&entry.description)
        .bind(&entry.metadata)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// A customer's interactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<CustomerInteraction>, RepositoryError> {
        let rows = sqlx::query_as::<_, InteractionRow>(
            "SELECT id, customer_id, interaction_type, description, metadata, created_at \
             FROM customer_interactions \
             WHERE customer_id = $1 \
             ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
