//! Dispatch configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DISPATCH_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `EMAIL_FROM` - Sender address, either `hello@example.com` or `Name <hello@example.com>`
//!
//! ## Optional
//! - `DISPATCH_HOST` - Bind address (default: 127.0.0.1)
//! - `DISPATCH_PORT` - Listen port (default: 3002)
//! - `DISPATCH_API_KEY` - Bearer token required on every API call when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (email provider, first match wins)
//! - `RESEND_API_KEY` - Resend API key; `RESEND_API_URL` overrides the base URL
//! - `SMTP_HOST` - SMTP relay; requires `SMTP_USERNAME` and `SMTP_PASSWORD`,
//!   `SMTP_PORT` defaults to 587
//! - neither set - deliveries are simulated and only logged

use std::net::{IpAddr, SocketAddr};

use lettre::message::Mailbox;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";
const MIN_API_KEY_LENGTH: usize = 24;
/// Below this many bits per character a key is treated as hand-typed.
const MIN_KEY_BITS_PER_CHAR: f64 = 3.3;

/// Fragments that show up in copied-from-docs keys. Matched case-insensitively.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "changeme",
    "example",
    "placeholder",
    "replace",
    "secret",
    "your-",
    "xxx",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEnvVar(String),
    #[error("{0} is invalid: {1}")]
    InvalidEnvVar(String, String),
    #[error("{0} is too weak: {1}")]
    WeakApiKey(String, String),
}

/// Dispatch service configuration.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// When set, every `/api` and `/functions` call must present this key.
    pub api_key: Option<SecretString>,
    pub email: EmailConfig,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Outbound email configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Sender address (From header)
    pub from_address: String,
    /// Which delivery backend to use
    pub provider: EmailProvider,
}

/// Email delivery backend selection.
#[derive(Debug, Clone)]
pub enum EmailProvider {
    /// Resend HTTP API.
    Resend(ResendConfig),
    /// SMTP relay via lettre.
    Smtp(SmtpConfig),
    /// No provider configured; deliveries are logged, not sent.
    Log,
}

impl EmailProvider {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Resend(_) => "resend",
            Self::Smtp(_) => "smtp",
            Self::Log => "log",
        }
    }
}

/// Resend API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ResendConfig {
    /// Resend API key
    pub api_key: SecretString,
    /// API base URL (overridable for testing)
    pub base_url: Url,
}

impl std::fmt::Debug for ResendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

/// SMTP relay configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl DispatchConfig {
    /// Read the process environment, after loading `.env` when one exists.
    ///
    /// # Errors
    ///
    /// Fails on a missing required variable, an unparsable value, or a
    /// `DISPATCH_API_KEY` that looks guessable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal in production.
        let _ = dotenvy::dotenv();
        Self::from_source(&|key: &str| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`DispatchConfig::from_env`].
    pub fn from_source(get: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Source(get);

        let database_url = env
            .optional("DISPATCH_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("DISPATCH_DATABASE_URL".to_string()))?;
        let host = env
            .or_default("DISPATCH_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DISPATCH_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("DISPATCH_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("DISPATCH_PORT".to_string(), e.to_string()))?;

        let api_key = match env.optional("DISPATCH_API_KEY") {
            Some(key) => {
                validate_api_key(&key, "DISPATCH_API_KEY")?;
                Some(SecretString::from(key))
            }
            None => None,
        };

        let email = EmailConfig::from_source(&env)?;

        Ok(Self {
            database_url,
            host,
            port,
            api_key,
            email,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env
                .optional("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: env
                .optional("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the configured API key, if callers must authenticate.
    #[must_use]
    pub const fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }
}

impl EmailConfig {
    fn from_source(env: &Source<'_>) -> Result<Self, ConfigError> {
        let from_address = env.required("EMAIL_FROM")?;
        from_address.parse::<Mailbox>().map_err(|e| {
            ConfigError::InvalidEnvVar("EMAIL_FROM".to_string(), e.to_string())
        })?;

        let provider = if let Some(api_key) = env.optional("RESEND_API_KEY") {
            let raw_url = env.or_default("RESEND_API_URL", DEFAULT_RESEND_API_URL);
            let base_url = Url::parse(&raw_url).map_err(|e| {
                ConfigError::InvalidEnvVar("RESEND_API_URL".to_string(), e.to_string())
            })?;
            EmailProvider::Resend(ResendConfig {
                api_key: SecretString::from(api_key),
                base_url,
            })
        } else if let Some(host) = env.optional("SMTP_HOST") {
            let port = env
                .or_default("SMTP_PORT", "587")
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;
            EmailProvider::Smtp(SmtpConfig {
                host,
                port,
                username: env.required("SMTP_USERNAME")?,
                password: SecretString::from(env.required("SMTP_PASSWORD")?),
            })
        } else {
            EmailProvider::Log
        };

        Ok(Self {
            from_address,
            provider,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Key lookup wrapper so tests can feed a map instead of the process env.
struct Source<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Source<'_> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Shannon entropy of `key` in bits per character.
fn bits_per_char(key: &str) -> f64 {
    let mut chars: Vec<char> = key.chars().collect();
    if chars.is_empty() {
        return 0.0;
    }
    chars.sort_unstable();

    #[allow(clippy::cast_precision_loss)]
    let total = chars.len() as f64;
    chars
        .chunk_by(|a, b| a == b)
        .map(|run| {
            #[allow(clippy::cast_precision_loss)]
            let share = run.len() as f64 / total;
            -share * share.log2()
        })
        .sum()
}

/// Reject keys that are short, copied from documentation, or low-entropy.
fn validate_api_key(key: &str, var_name: &str) -> Result<(), ConfigError> {
    let weak = |reason: String| Err(ConfigError::WeakApiKey(var_name.to_string(), reason));

    if key.len() < MIN_API_KEY_LENGTH {
        return weak(format!(
            "{} characters, need at least {MIN_API_KEY_LENGTH}",
            key.len()
        ));
    }
    let lowered = key.to_ascii_lowercase();
    if let Some(marker) = PLACEHOLDER_MARKERS.iter().find(|m| lowered.contains(*m)) {
        return weak(format!("looks like a placeholder ({marker:?})"));
    }
    let bits = bits_per_char(key);
    if bits < MIN_KEY_BITS_PER_CHAR {
        return weak(format!(
            "{bits:.2} bits per character, generate a random key instead"
        ));
    }
    Ok(())
}

/// Compare a presented bearer token with the configured key.
#[must_use]
pub fn api_key_matches(configured: &SecretString, presented: &str) -> bool {
    let expected = configured.expose_secret().as_bytes();
    let presented = presented.as_bytes();
    expected.len() == presented.len()
        && expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
