//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::DispatchConfig;
use crate::services::{Dispatcher, Mailer, MailerError, build_mailer};
use crate::store::{CrmStore, PgStore};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the configuration, the connection pool
/// used by the CRM API, and the dispatcher built from a store and a mailer.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DispatchConfig,
    pool: PgPool,
    dispatcher: Dispatcher,
}

impl AppState {
    /// Create production state: a `PgStore` over `pool` and the configured mailer.
    ///
    /// # Errors
    ///
    /// Returns `MailerError` if the email backend cannot be constructed.
    pub fn new(config: DispatchConfig, pool: PgPool) -> Result<Self, MailerError> {
        let mailer = build_mailer(&config.email)?;
        let store = Arc::new(PgStore::new(pool.clone()));
        Ok(Self::from_parts(config, pool, store, mailer))
    }

    /// Assemble state from explicit parts.
    #[must_use]
    pub fn from_parts(
        config: DispatchConfig,
        pool: PgPool,
        store: Arc<dyn CrmStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                dispatcher: Dispatcher::new(store, mailer),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }
}
