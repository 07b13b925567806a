//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `EMPORIUM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `EMPORIUM_TOKEN_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `EMPORIUM_HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8080)
//! - `EMPORIUM_ACCESS_TOKEN_TTL_HOURS` - Access token lifetime (default: 24)
//! - `EMPORIUM_REFRESH_TOKEN_TTL_HOURS` - Refresh token lifetime (default: 168)
//! - `EMPORIUM_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `EMPORIUM_CORS_ORIGINS` - Comma-separated allowed origins (default: any)
//! - `EMPORIUM_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Longest accepted token lifetime (ten years).
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

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

/// API application configuration.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Token issuing and request handling settings
    pub auth: AuthConfig,
    /// Upper bound on the time spent handling one request
    pub request_timeout: Duration,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Token signing configuration.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify tokens
    pub token_secret: SecretString,
    /// Lifetime of access tokens
    pub access_token_ttl: chrono::Duration,
    /// Lifetime of refresh tokens
    pub refresh_token_ttl: chrono::Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[REDACTED]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("EMPORIUM_DATABASE_URL")?;
        let host = parse_env::<IpAddr>("EMPORIUM_HOST", "0.0.0.0")?;
        let port = parse_env::<u16>("PORT", "8080")?;
        let auth = AuthConfig::from_env()?;
        let request_timeout =
            Duration::from_secs(parse_env::<u64>("EMPORIUM_REQUEST_TIMEOUT_SECS", "30")?);
        let cors_origins = get_optional_env("EMPORIUM_CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();

        Ok(Self {
            database_url,
            host,
            port,
            auth,
            request_timeout,
            cors_origins,
            log_json: get_optional_env("EMPORIUM_LOG_JSON").is_some(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env::<f32>("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AuthConfig {
    /// Default access token lifetime in hours.
    pub const DEFAULT_ACCESS_TTL_HOURS: i64 = 24;
    /// Default refresh token lifetime in hours.
    pub const DEFAULT_REFRESH_TTL_HOURS: i64 = 168;

    fn from_env() -> Result<Self, ConfigError> {
        let token_secret = get_validated_secret("EMPORIUM_TOKEN_SECRET")?;
        validate_secret_length(&token_secret, "EMPORIUM_TOKEN_SECRET")?;

        let access_hours = parse_env::<i64>(
            "EMPORIUM_ACCESS_TOKEN_TTL_HOURS",
            &Self::DEFAULT_ACCESS_TTL_HOURS.to_string(),
        )?;
        let refresh_hours = parse_env::<i64>(
            "EMPORIUM_REFRESH_TOKEN_TTL_HOURS",
            &Self::DEFAULT_REFRESH_TTL_HOURS.to_string(),
        )?;
        let (access_token_ttl, refresh_token_ttl) = validate_ttls(access_hours, refresh_hours)?;

        Ok(Self {
            token_secret,
            access_token_ttl,
            refresh_token_ttl,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Both lifetimes must lie in `1..=MAX_TOKEN_TTL_HOURS` and refresh tokens
/// must outlive access tokens.
fn validate_ttls(
    access_hours: i64,
    refresh_hours: i64,
) -> Result<(chrono::Duration, chrono::Duration), ConfigError> {
    let access = ttl_hours("EMPORIUM_ACCESS_TOKEN_TTL_HOURS", access_hours)?;
    let refresh = ttl_hours("EMPORIUM_REFRESH_TOKEN_TTL_HOURS", refresh_hours)?;
    if refresh_hours <= access_hours {
        return Err(ConfigError::InvalidEnvVar(
            "EMPORIUM_REFRESH_TOKEN_TTL_HOURS".to_string(),
            format!("must be greater than the access token lifetime ({access_hours}h)"),
        ));
    }
    Ok((access, refresh))
}

fn ttl_hours(key: &str, hours: i64) -> Result<chrono::Duration, ConfigError> {
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 1 and {MAX_TOKEN_TTL_HOURS} hours"),
        ));
    }
    chrono::Duration::try_hours(hours).ok_or_else(|| {
        ConfigError::InvalidEnvVar(key.to_string(), "lifetime out of range".to_string())
    })
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
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

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
