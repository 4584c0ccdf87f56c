//! Database operations for the CRM `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `customers` - Customer records (tags as `TEXT[]`, metadata as JSONB)
//! - `email_campaigns` - Campaign templates, targeting and status
//! - `customer_interactions` - Append-only interaction log
//!
//! # Migrations
//!
//! Migrations are stored in `crates/dispatch/migrations/` and run via:
//! ```bash
//! cargo run -p outreach-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as::<_, Row>` so the crate
//! compiles without a live database.

pub mod campaigns;
pub mod customers;
pub mod dashboard;
pub mod interactions;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use campaigns::{CampaignPatch, CampaignRepository};
pub use customers::CustomerRepository;
pub use dashboard::DashboardRepository;
pub use interactions::InteractionRepository;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A stored row no longer satisfies the domain types (for example an
    /// email that fails parsing).
    #[error("stored row is invalid: {0}")]
    DataCorruption(String),

    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique-constraint violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(format!("{what} already exists"))
            }
            _ => Self::Database(err),
        }
    }
}

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

/// Connect eagerly, keeping one connection warm.
///
/// # Errors
///
/// Fails if the first connection cannot be opened.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options()
        .min_connections(1)
        .connect(database_url.expose_secret())
        .await
}

/// A pool that opens connections on first use, for callers that may never
/// query.
///
/// # Errors
///
/// Fails only if the URL does not parse.
pub fn create_lazy_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect_lazy(database_url.expose_secret())
}

/// Empty-string-clears convention for optional text columns.
///
/// `None` keeps the column, `Some("")` stores NULL, anything else is trimmed.
pub(crate) fn patch_text(value: Option<&str>) -> (bool, Option<String>) {
    match value {
        None => (false, None),
        Some(v) => {
            let v = v.trim();
            (true, (!v.is_empty()).then(|| v.to_string()))
        }
    }
}

/// Trim an optional text value and turn blanks into `None`.
pub(crate) fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_text() {
        assert_eq!(patch_text(None), (false, None));
        assert_eq!(patch_text(Some("  ")), (true, None));
        assert_eq!(patch_text(Some(" Acme ")), (true, Some("Acme".to_string())));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text(None), None);
        assert_eq!(clean_text(Some("")), None);
        assert_eq!(clean_text(Some(" x ")), Some("x".to_string()));
    }

    #[test]
    fn test_repository_error_display() {
        assert_eq!(RepositoryError::NotFound.to_string(), "record not found");
        assert_eq!(
            RepositoryError::Conflict("customer email already exists".to_string()).to_string(),
            "customer email already exists"
        );
    }
}
