//! CLI command implementations.

pub mod campaign;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use outreach_dispatch::config::ConfigError;
use outreach_dispatch::db::{self, RepositoryError};
use outreach_dispatch::services::{DispatchError, MailerError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailer error: {0}")]
    Mailer(#[from] MailerError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid seed file: {0}")]
    Seed(String),

    #[error("Invalid campaign id: {0}")]
    InvalidId(String),
}

/// Resolve the database URL the same way the server does.
pub(crate) fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();
    std::env::var("DISPATCH_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.trim().is_empty())
        .map(SecretString::from)
        .ok_or(CommandError::MissingEnvVar("DISPATCH_DATABASE_URL"))
}

/// Connect using [`database_url`].
pub(crate) async fn connect() -> Result<PgPool, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}
