//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `HIVE_API_URL` - Catalog/order API base (default: `https://bee-energy-backend.onrender.com/api`)
//! - `HIVE_CATEGORIES_URL` - Category table endpoint (categories are skipped when unset)
//! - `HIVE_CATEGORIES_TOKEN` - `xc-token` for the category table API
//! - `HIVE_STATE_DIR` - Directory for the persisted cart and wishlist (default: `.hive`)
//! - `HIVE_CURRENCY` - Display currency code (default: `NGN`)
//! - `HIVE_FETCH_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `HIVE_FETCH_MAX_RETRIES` - Retries after the first attempt (default: 3)
//! - `HIVE_FETCH_BACKOFF_MS` - First retry delay, doubled each retry (default: 1000)
//! - `HIVE_CATALOG_CACHE_TTL_SECS` - Catalog list cache TTL (default: 300)
//! - `HIVE_UNRESOLVED_POLICY` - `drop` or `flag` for cart entries missing from the catalog
//! - `HIVE_PAYMENT_PATH` - Order initiation path under the API base (default: `/payments/initiate`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use solar_hive_core::CurrencyCode;
use thiserror::Error;
use url::Url;

use crate::resolve::UnresolvedPolicy;

const DEFAULT_API_URL: &str = "https://bee-energy-backend.onrender.com/api";
const DEFAULT_PAYMENT_PATH: &str = "/payments/initiate";
const DEFAULT_VERIFY_PATH: &str = "/orders/verify";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct HiveConfig {
    /// Catalog API configuration
    pub catalog: CatalogConfig,
    /// Payment handoff configuration
    pub payment: PaymentConfig,
    /// Directory holding persisted cart and wishlist state
    pub state_dir: PathBuf,
    /// Currency used for display formatting
    pub currency: CurrencyCode,
    /// What resolution does with cart entries missing from the catalog
    pub unresolved_policy: UnresolvedPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Catalog API configuration.
///
/// Implements `Debug` manually to redact the category token.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Base URL serving `/products` and `/plans`
    pub api_url: Url,
    /// Full URL of the category listing, if categories are enabled
    pub categories_url: Option<Url>,
    /// Token sent as `xc-token` to the category API
    pub categories_token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each further retry
    pub backoff_base: Duration,
    /// How long fetched lists stay cached
    pub cache_ttl: Duration,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("api_url", &self.api_url.as_str())
            .field("categories_url", &self.categories_url.as_ref().map(Url::as_str))
            .field(
                "categories_token",
                &self.categories_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff_base", &self.backoff_base)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl CatalogConfig {
    /// Configuration for an API base with default timeouts and retries.
    #[must_use]
    pub const fn new(api_url: Url) -> Self {
        Self {
            api_url,
            categories_url: None,
            categories_token: None,
            timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            cache_ttl: Duration::from_secs(300),
        }
    }

    /// Join a path onto the API base, keeping the base's own path segments.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.api_url, path)
    }
}

/// Payment handoff configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Full URL of the order initiation endpoint
    pub initiate_url: String,
    /// Base URL of payment verification; the reference is appended
    pub verify_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HiveConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value or the
    /// category token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`HiveConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let api_url = vars.parse_or("HIVE_API_URL", DEFAULT_API_URL, Url::parse)?;
        let categories_url = vars.parse_optional("HIVE_CATEGORIES_URL", Url::parse)?;
        let categories_token = vars
            .optional("HIVE_CATEGORIES_TOKEN")
            .map(|token| get_validated_secret("HIVE_CATEGORIES_TOKEN", token))
            .transpose()?;
        let timeout = Duration::from_secs(vars.parse_or("HIVE_FETCH_TIMEOUT_SECS", "10", u64::from_str)?);

        let catalog = CatalogConfig {
            categories_url,
            categories_token,
            timeout,
            max_retries: vars.parse_or("HIVE_FETCH_MAX_RETRIES", "3", u32::from_str)?,
            backoff_base: Duration::from_millis(
                vars.parse_or("HIVE_FETCH_BACKOFF_MS", "1000", u64::from_str)?,
            ),
            cache_ttl: Duration::from_secs(
                vars.parse_or("HIVE_CATALOG_CACHE_TTL_SECS", "300", u64::from_str)?,
            ),
            ..CatalogConfig::new(api_url)
        };

        let payment_path = vars
            .optional("HIVE_PAYMENT_PATH")
            .unwrap_or_else(|| DEFAULT_PAYMENT_PATH.to_string());
        let payment = PaymentConfig {
            initiate_url: catalog.endpoint(&payment_path),
            verify_url: catalog.endpoint(DEFAULT_VERIFY_PATH),
            timeout,
        };

        Ok(Self {
            payment,
            state_dir: PathBuf::from(
                vars.optional("HIVE_STATE_DIR")
                    .unwrap_or_else(|| ".hive".to_string()),
            ),
            currency: vars.parse_or("HIVE_CURRENCY", "NGN", CurrencyCode::from_str)?,
            unresolved_policy: vars.parse_or("HIVE_UNRESOLVED_POLICY", "drop", UnresolvedPolicy::from_str)?,
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
            catalog,
        })
    }

    /// Configuration pointing at an API base, everything else defaulted.
    #[must_use]
    pub fn for_api(api_url: Url) -> Self {
        let catalog = CatalogConfig::new(api_url);
        let payment = PaymentConfig {
            initiate_url: catalog.endpoint(DEFAULT_PAYMENT_PATH),
            verify_url: catalog.endpoint(DEFAULT_VERIFY_PATH),
            timeout: catalog.timeout,
        };
        Self {
            catalog,
            payment,
            state_dir: PathBuf::from(".hive"),
            currency: CurrencyCode::default(),
            unresolved_policy: UnresolvedPolicy::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Borrowed variable lookup with typed accessors.
struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Parse a variable, falling back to a default literal.
    fn parse_or<T, E, P>(&self, key: &str, default: &str, parse: P) -> Result<T, ConfigError>
    where
        P: Fn(&str) -> Result<T, E>,
        E: std::fmt::Display,
    {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse a variable only if it is set.
    fn parse_optional<T, E, P>(&self, key: &str, parse: P) -> Result<Option<T>, ConfigError>
    where
        P: Fn(&str) -> Result<T, E>,
        E: std::fmt::Display,
    {
        self.optional(key)
            .map(|raw| {
                parse(raw.trim())
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }
}

/// Join a path onto a base URL without dropping the base's last segment.
fn join_url(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
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

    #[allow(clippy::cast_precision_loss)] // Token length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholder tokens and tokens with too little entropy.
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Validate a secret value and wrap it.
fn get_validated_secret(key: &str, value: String) -> Result<SecretString, ConfigError> {
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Expose a secret for a request header.
pub(crate) fn expose(secret: &SecretString) -> &str {
    secret.expose_secret()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = HiveConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.catalog.api_url.as_str(), DEFAULT_API_URL);
        assert_eq!(config.catalog.max_retries, 3);
        assert_eq!(config.catalog.backoff_base, Duration::from_secs(1));
        assert_eq!(config.catalog.timeout, Duration::from_secs(10));
        assert!(config.catalog.categories_url.is_none());
        assert_eq!(config.currency, CurrencyCode::NGN);
        assert_eq!(config.unresolved_policy, UnresolvedPolicy::Drop);
        assert_eq!(config.state_dir, PathBuf::from(".hive"));
        assert_eq!(
            config.payment.initiate_url,
            "https://bee-energy-backend.onrender.com/api/payments/initiate"
        );
        assert_eq!(
            config.payment.verify_url,
            "https://bee-energy-backend.onrender.com/api/orders/verify"
        );
    }

    #[test]
    fn test_overrides() {
        let config = HiveConfig::from_lookup(lookup(&[
            ("HIVE_API_URL", "http://127.0.0.1:9000/v2/"),
            ("HIVE_CURRENCY", "usd"),
            ("HIVE_FETCH_MAX_RETRIES", "5"),
            ("HIVE_FETCH_BACKOFF_MS", "20"),
            ("HIVE_UNRESOLVED_POLICY", "flag"),
            ("HIVE_PAYMENT_PATH", "orders/checkout"),
            ("HIVE_STATE_DIR", "/tmp/hive"),
        ]))
        .unwrap();

        assert_eq!(config.catalog.endpoint("/products"), "http://127.0.0.1:9000/v2/products");
        assert_eq!(config.payment.initiate_url, "http://127.0.0.1:9000/v2/orders/checkout");
        assert_eq!(config.currency, CurrencyCode::USD);
        assert_eq!(config.catalog.max_retries, 5);
        assert_eq!(config.catalog.backoff_base, Duration::from_millis(20));
        assert_eq!(config.unresolved_policy, UnresolvedPolicy::Flag);
        assert_eq!(config.state_dir, PathBuf::from("/tmp/hive"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = HiveConfig::from_lookup(lookup(&[("HIVE_CURRENCY", "  ")])).unwrap();
        assert_eq!(config.currency, CurrencyCode::NGN);
    }

    #[test]
    fn test_invalid_values_are_reported_with_their_key() {
        let err = HiveConfig::from_lookup(lookup(&[("HIVE_FETCH_MAX_RETRIES", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "HIVE_FETCH_MAX_RETRIES"));

        let err = HiveConfig::from_lookup(lookup(&[("HIVE_API_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "HIVE_API_URL"));
    }

    #[test]
    fn test_placeholder_category_token_is_rejected() {
        let err = HiveConfig::from_lookup(lookup(&[("HIVE_CATEGORIES_TOKEN", "your-token-here")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_low_entropy_category_token_is_rejected() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("mqtJCDv1JtwM_2rl7m3kKRqC") > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_catalog_config_debug_redacts_token() {
        let config = HiveConfig::from_lookup(lookup(&[
            ("HIVE_CATEGORIES_URL", "https://tables.test/api/v2/records"),
            ("HIVE_CATEGORIES_TOKEN", "q7Lm2Zx9Rt4Kp8Vw3Nb6Hc1J"),
        ]))
        .unwrap();

        let debug_output = format!("{:?}", config.catalog);
        assert!(debug_output.contains("tables.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("q7Lm2Zx9Rt4Kp8Vw3Nb6Hc1J"));
    }
}
