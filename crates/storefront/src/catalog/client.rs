//! Catalog REST API client.
//!
//! Plain `GET` requests against `{api_url}/products` and `{api_url}/plans`,
//! plus the category table endpoint, which answers `{"list": [...]}` and
//! wants its token in an `xc-token` header. Lists are cached for the
//! configured TTL.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::CatalogError;
use super::cache::{CacheKey, CacheValue};
use super::types::{Category, Plan, Product};
use crate::config::{CatalogConfig, expose};

// =============================================================================
// RetryPolicy
// =============================================================================

/// Bounded retry with exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
        }
    }

    /// Delay before retry number `retry` (zero-based): `base * 2^retry`.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(retry))
    }

    /// Run `attempt` until it succeeds, fails permanently, or retries run out.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient error, or the last transient error
    /// once `max_retries` retries have been spent.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let mut retry = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retry < self.max_retries => {
                    let delay = self.delay_for(retry);
                    warn!(
                        operation,
                        retry = retry + 1,
                        max_retries = self.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "transient catalog failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the catalog read API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    products_url: String,
    plans_url: String,
    categories_url: Option<String>,
    categories_token: Option<SecretString>,
    timeout: Duration,
    retry: RetryPolicy,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                products_url: config.endpoint("products"),
                plans_url: config.endpoint("plans"),
                categories_url: config.categories_url.as_ref().map(ToString::to_string),
                categories_token: config.categories_token.clone(),
                timeout: config.timeout,
                retry: RetryPolicy::new(config.max_retries, config.backoff_base),
                cache,
            }),
        }
    }

    /// Retry policy applied to every fetch.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.retry
    }

    /// Whether a category endpoint is configured.
    #[must_use]
    pub fn has_categories(&self) -> bool {
        self.inner.categories_url.is_some()
    }

    /// Fetch all products.
    ///
    /// # Errors
    ///
    /// Returns an error once retries are exhausted or on a permanent failure.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        let body = self.get_json("products", &self.inner.products_url, None).await?;
        let products: Vec<Product> = decode_list(into_array(body, None)?, "product");

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::new(products.clone())))
            .await;
        Ok(products)
    }

    /// Fetch all subscription plans.
    ///
    /// # Errors
    ///
    /// Returns an error once retries are exhausted or on a permanent failure.
    #[instrument(skip(self))]
    pub async fn fetch_plans(&self) -> Result<Vec<Plan>, CatalogError> {
        if let Some(CacheValue::Plans(plans)) = self.inner.cache.get(&CacheKey::Plans).await {
            debug!("Cache hit for plans");
            return Ok(plans.as_ref().clone());
        }

        let body = self.get_json("plans", &self.inner.plans_url, None).await?;
        let plans: Vec<Plan> = decode_list(into_array(body, None)?, "plan");

        self.inner
            .cache
            .insert(CacheKey::Plans, CacheValue::Plans(Arc::new(plans.clone())))
            .await;
        Ok(plans)
    }

    /// Fetch product categories from the category table API.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotConfigured` when no category URL is set,
    /// otherwise the same failures as the other fetches.
    #[instrument(skip(self))]
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let Some(url) = self.inner.categories_url.as_deref() else {
            return Err(CatalogError::NotConfigured("categories"));
        };

        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories.as_ref().clone());
        }

        let token = self.inner.categories_token.as_ref();
        let body = self.get_json("categories", url, token).await?;
        let categories: Vec<Category> = decode_list(into_array(body, Some("list"))?, "category");

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::new(categories.clone())),
            )
            .await;
        Ok(categories)
    }

    /// Drop every cached list so the next fetch hits the API.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    /// GET a JSON document, retrying transient failures.
    async fn get_json(
        &self,
        operation: &str,
        url: &str,
        token: Option<&SecretString>,
    ) -> Result<Value, CatalogError> {
        self.inner
            .retry
            .run(operation, || self.get_json_once(url, token))
            .await
    }

    async fn get_json_once(
        &self,
        url: &str,
        token: Option<&SecretString>,
    ) -> Result<Value, CatalogError> {
        let mut request = self
            .inner
            .client
            .get(url)
            .timeout(self.inner.timeout)
            .header("Accept", "application/json");
        if let Some(token) = token {
            request = request.header("xc-token", expose(token));
        }

        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            warn!(
                status = %status,
                url,
                body = %response_text.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            warn!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("products_url", &self.inner.products_url)
            .field("plans_url", &self.inner.plans_url)
            .field("categories_url", &self.inner.categories_url)
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Take the array out of a response body, optionally wrapped in an object field.
fn into_array(body: Value, wrapper: Option<&str>) -> Result<Vec<Value>, CatalogError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut fields) => match wrapper.and_then(|key| fields.remove(key)) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(CatalogError::InvalidFormat(format!(
                "expected a list{}",
                wrapper.map(|key| format!(" under `{key}`")).unwrap_or_default()
            ))),
        },
        other => Err(CatalogError::InvalidFormat(format!(
            "expected a JSON array, got {}",
            json_type(&other)
        ))),
    }
}

/// Decode each element, skipping the ones that don't fit.
fn decode_list<T: DeserializeOwned>(items: Vec<Value>, what: &str) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|e| warn!(what, index, error = %e, "skipping undecodable catalog item"))
                .ok()
        })
        .collect();

    debug!(what, total, kept = decoded.len(), "decoded catalog list");
    decoded
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
