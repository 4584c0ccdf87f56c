//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! outreach migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DISPATCH_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migration files live in `crates/dispatch/migrations/` and are embedded at
//! compile time.

use outreach_dispatch::db::MIGRATOR;

use super::{CommandError, connect};

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!(available = MIGRATOR.iter().count(), "Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
