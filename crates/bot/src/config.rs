//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SLACK_SIGNING_SECRET` - Slack app signing secret (high entropy)
//!
//! ## Optional
//! - `SLACK_BUD_ENV` - Environment commands run against (default: dev)
//! - `BOT_HOST` - Bind address (default: 127.0.0.1)
//! - `BOT_PORT` - Listen port (default: 3002)
//! - `SESSION_TTL_SECS` - How long confirmation prompts stay open (default: 900)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use slack_bud_core::DEFAULT_ENVIRONMENT;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SESSION_TTL_SECS: u64 = 900;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Bot configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct BotConfig {
    /// Slack app signing secret
    pub signing_secret: SecretString,
    /// Environment every invocation runs against
    pub environment: String,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Lifetime of an unanswered confirmation prompt
    pub session_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "dev", "staging", "prod")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("signing_secret", &"[REDACTED]")
            .field("environment", &self.environment)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("session_ttl", &self.session_ttl)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[SET]"))
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .finish()
    }
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing secret fails validation (placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let signing_secret = env.validated_secret("SLACK_SIGNING_SECRET")?;

        let environment = env
            .optional("SLACK_BUD_ENV")
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let host = env
            .or_default("BOT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOT_HOST".to_string(), e.to_string()))?;

        let port = env
            .or_default("BOT_PORT", "3002")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOT_PORT".to_string(), e.to_string()))?;

        let session_ttl_secs = env
            .or_default("SESSION_TTL_SECS", &DEFAULT_SESSION_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SESSION_TTL_SECS".to_string(), e.to_string())
            })?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SESSION_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            signing_secret,
            environment,
            host,
            port,
            session_ttl: Duration::from_secs(session_ttl_secs),
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get a required environment variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        (self.0)(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional environment variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Get an environment variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
