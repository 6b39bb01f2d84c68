//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PROFFMUSIC_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `PROFFMUSIC_HOST` - Bind address (default: 127.0.0.1)
//! - `PROFFMUSIC_PORT` - Listen port (default: 3000)
//! - `PROFFMUSIC_API_URL` - Music API root (default: `http://127.0.0.1:8000/api`)
//! - `PROFFMUSIC_MEDIA_ORIGIN` - Origin serving covers and previews
//!   (default: origin of the API URL)
//! - `PROFFMUSIC_API_TIMEOUT_SECS` - Per-request API timeout (default: 10)
//! - `PROFFMUSIC_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `PROFFMUSIC_MOCK_PAYMENTS` - Serve the payment emulator (default: false)
//! - `PROFFMUSIC_STATIC_DIR` - Static asset directory (default: crates/storefront/static)
//! - `PROFFMUSIC_LOG_JSON` - Emit JSON logs (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (default: development)
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Music API client configuration
    pub api: ApiConfig,
    /// Whether `/mock-payment` is served
    pub mock_payments: bool,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Sentry error tracking configuration
    pub sentry: SentryConfig,
}

/// Music API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root, always ending in `/` so relative joins stay under it
    pub base_url: Url,
    /// Origin serving media files, admitted by the CSP
    pub media_origin: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Lifetime of cached catalog reads
    pub cache_ttl: Duration,
}

impl ApiConfig {
    pub const DEFAULT_URL: &'static str = "http://127.0.0.1:8000/api";

    /// API configuration with default timeout and cache lifetime.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is not an absolute http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        let base_url = parse_api_url(api_url)?;
        let media_origin = base_url.origin().ascii_serialization();
        Ok(Self {
            base_url,
            media_origin,
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
        })
    }
}

/// Sentry configuration.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: String,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: "development".to_string(),
            sample_rate: 1.0,
            traces_sample_rate: 0.1,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parse_or("PROFFMUSIC_HOST", "127.0.0.1")?;
        let port = env.parse_or("PROFFMUSIC_PORT", "3000")?;
        let base_url = env.required("PROFFMUSIC_BASE_URL")?;

        let mut api = ApiConfig::new(&env.or_default("PROFFMUSIC_API_URL", ApiConfig::DEFAULT_URL))?;
        if let Some(origin) = env.optional("PROFFMUSIC_MEDIA_ORIGIN") {
            api.media_origin = origin.trim_end_matches('/').to_string();
        }
        api.timeout = Duration::from_secs(env.parse_or("PROFFMUSIC_API_TIMEOUT_SECS", "10")?);
        api.cache_ttl = Duration::from_secs(env.parse_or("PROFFMUSIC_CACHE_TTL_SECS", "300")?);

        let mock_payments = env.flag("PROFFMUSIC_MOCK_PAYMENTS")?;
        let static_dir =
            PathBuf::from(env.or_default("PROFFMUSIC_STATIC_DIR", "crates/storefront/static"));
        let log_json = env.flag("PROFFMUSIC_LOG_JSON")?;

        let defaults = SentryConfig::default();
        let sentry = SentryConfig {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.or_default("SENTRY_ENVIRONMENT", &defaults.environment),
            sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            api,
            mock_payments,
            static_dir,
            log_json,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (session cookie `Secure` flag).
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source with the lookup helpers used by [`StorefrontConfig::from_lookup`].
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn flag(&self, key: &str) -> Result<bool, ConfigError> {
        match self.or_default(key, "false").trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }
}

/// Parse the API root, forcing a trailing slash.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid =
        |reason: String| ConfigError::InvalidEnvVar("PROFFMUSIC_API_URL".to_string(), reason);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("PROFFMUSIC_BASE_URL", "http://localhost:3000")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.api.base_url.as_str(), "http://127.0.0.1:8000/api/");
        assert_eq!(config.api.media_origin, "http://127.0.0.1:8000");
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.api.cache_ttl, Duration::from_secs(300));
        assert!(!config.mock_payments);
        assert!(!config.is_https());
        assert!(config.sentry.dsn.is_none());
    }

    #[test]
    fn test_base_url_required() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "PROFFMUSIC_BASE_URL"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PROFFMUSIC_BASE_URL", "https://proffmusic.ru"),
            ("PROFFMUSIC_PORT", "8080"),
            ("PROFFMUSIC_API_URL", "https://api.proffmusic.ru/api/"),
            ("PROFFMUSIC_MEDIA_ORIGIN", "https://cdn.proffmusic.ru/"),
            ("PROFFMUSIC_MOCK_PAYMENTS", "true"),
            ("PROFFMUSIC_CACHE_TTL_SECS", "0"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.api.base_url.as_str(), "https://api.proffmusic.ru/api/");
        assert_eq!(config.api.media_origin, "https://cdn.proffmusic.ru");
        assert_eq!(config.api.cache_ttl, Duration::ZERO);
        assert!(config.mock_payments);
        assert!(config.is_https());
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[
            ("PROFFMUSIC_BASE_URL", "http://localhost:3000"),
            ("PROFFMUSIC_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "PROFFMUSIC_PORT"));

        let err = load(&[
            ("PROFFMUSIC_BASE_URL", "http://localhost:3000"),
            ("PROFFMUSIC_API_URL", "ftp://files"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "PROFFMUSIC_API_URL"));

        let err = load(&[
            ("PROFFMUSIC_BASE_URL", "http://localhost:3000"),
            ("PROFFMUSIC_MOCK_PAYMENTS", "perhaps"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }
}
