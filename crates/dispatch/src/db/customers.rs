//! Customer repository.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use outreach_core::{CustomerId, CustomerStatus, Email, normalize_tags};

use super::{RepositoryError, clean_text, patch_text};
use crate::models::{Customer, CustomerFilter, CustomerUpdate, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, email, first_name, last_name, phone, company, status, \
                                tags, metadata, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    company: Option<String>,
    status: CustomerStatus,
    tags: Vec<String>,
    metadata: JsonValue,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            company: row.company,
            status: row.status,
            tags: row.tags,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn collect(rows: Vec<CustomerRow>) -> Result<Vec<Customer>, RepositoryError> {
    rows.into_iter().map(TryInto::try_into).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List customers, newest first, optionally filtered by status and tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, RepositoryError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE ($1::customer_status IS NULL OR status = $1) \
               AND ($2::text IS NULL OR $2 = ANY(tags)) \
             ORDER BY created_at DESC"
        );
        let tag = clean_text(filter.tag.as_deref());
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(filter.status)
            .bind(tag)
            .fetch_all(self.pool)
            .await?;

        collect(rows)
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a new customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken.
    /// Returns `RepositoryError::Database` if the insert fails otherwise.
    pub async fn create(&self, input: &NewCustomer) -> Result<Customer, RepositoryError> {
        let sql = format!(
            "INSERT INTO customers \
                 (id, email, first_name, last_name, phone, company, status, tags, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let metadata = input
            .metadata
            .clone()
            .unwrap_or_else(|| JsonValue::Object(serde_json::Map::new()));

        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(CustomerId::generate())
            .bind(input.email.as_str())
            .bind(clean_text(input.first_name.as_deref()))
            .bind(clean_text(input.last_name.as_deref()))
            .bind(clean_text(input.phone.as_deref()))
            .bind(clean_text(input.company.as_deref()))
            .bind(input.status)
            .bind(normalize_tags(&input.tags))
            .bind(metadata)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "customer email"))?;

        row.try_into()
    }

    /// Apply a partial update.
    ///
    /// Returns `None` if the customer does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email is already taken.
    /// Returns `RepositoryError::Database` if the update fails otherwise.
    pub async fn update(
        &self,
        id: CustomerId,
        update: &CustomerUpdate,
    ) -> Result<Option<Customer>, RepositoryError> {
        let sql = format!(
            "UPDATE customers SET \
                 email = COALESCE($2, email), \
                 first_name = CASE WHEN $3 THEN $4 ELSE first_name END, \
                 last_name = CASE WHEN $5 THEN $6 ELSE last_name END, \
                 phone = CASE WHEN $7 THEN $8 ELSE phone END, \
                 company = CASE WHEN $9 THEN $10 ELSE company END, \
                 status = COALESCE($11, status), \
                 tags = COALESCE($12, tags), \
                 metadata = COALESCE($13, metadata), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let (set_first, first_name) = patch_text(update.first_name.as_deref());
        let (set_last, last_name) = patch_text(update.last_name.as_deref());
        let (set_phone, phone) = patch_text(update.phone.as_deref());
        let (set_company, company) = patch_text(update.company.as_deref());

        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .bind(update.email.as_ref().map(Email::as_str))
            .bind(set_first)
            .bind(first_name)
            .bind(set_last)
            .bind(last_name)
            .bind(set_phone)
            .bind(phone)
            .bind(set_company)
            .bind(company)
            .bind(update.status)
            .bind(update.tags.as_ref().map(normalize_tags))
            .bind(update.metadata.clone())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "customer email"))?;

        row.map(TryInto::try_into).transpose()
    }

    /// Delete a customer and, via cascade, their interactions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row was deleted.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Active customers sharing at least one of `target_tags`.
    ///
    /// An empty `target_tags` selects every active customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn audience(&self, target_tags: &[String]) -> Result<Vec<Customer>, RepositoryError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE status = 'active' \
               AND (cardinality($1::text[]) = 0 OR tags && $1::text[]) \
             ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(target_tags)
            .fetch_all(self.pool)
            .await?;

        collect(rows)
    }
}
