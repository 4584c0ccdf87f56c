//! Outreach Dispatch - CRM API and campaign email dispatch.
//!
//! Serves the CRM JSON API and `POST /functions/v1/send-automated-email`
//! (default port 3002). Delivery goes through Resend or SMTP, or is only
//! logged when neither is configured.
//!
//! Migrations are not run on startup. Run them explicitly via:
//! `cargo run -p outreach-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use outreach_dispatch::config::{ConfigError, DispatchConfig};
use outreach_dispatch::services::MailerError;
use outreach_dispatch::{db, state::AppState};

const DEFAULT_LOG_FILTER: &str = "outreach_dispatch=info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("mailer: {0}")]
    Mailer(#[from] MailerError),
    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

fn init_sentry(config: &DispatchConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;
    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config.sentry_environment.clone().map(Cow::Owned),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
        attach_stacktrace: true,
        // Customer addresses must not reach error reports.
        send_default_pii: false,
        ..Default::default()
    };
    Some(sentry::init((dsn, options)))
}

/// Warnings and errors become Sentry events; info and debug ride along as
/// breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    let level = *metadata.level();
    if level <= tracing::Level::WARN {
        sentry_tracing::EventFilter::Event
    } else if level <= tracing::Level::DEBUG {
        sentry_tracing::EventFilter::Breadcrumb
    } else {
        sentry_tracing::EventFilter::Ignore
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // Fly.io ingests structured logs; plain text is easier to read locally.
    let structured = std::env::var_os("FLY_APP_NAME").is_some();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(structured.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true)))
        .with((!structured).then(tracing_subscriber::fmt::layer))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let config = match DispatchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // The Sentry client has to exist before the tracing layer forwards to it.
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(config).await {
        tracing::error!("dispatch stopped: {e}");
        std::process::exit(1);
    }
}

async fn run(config: DispatchConfig) -> Result<(), StartupError> {
    if config.sentry_dsn.is_some() {
        tracing::info!("Sentry initialized");
    }
    if config.api_key().is_none() {
        tracing::warn!("DISPATCH_API_KEY is not set; API routes are unauthenticated");
    }

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    let addr = config.socket_addr();
    let state = AppState::new(config, pool)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("dispatch listening on http://{addr}");

    axum::serve(listener, outreach_dispatch::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl+C handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
