//! Catalog snapshots with load status.

use std::future::Future;

use super::{CatalogClient, CatalogError};
use super::types::{Category, Plan, Product};

/// Where a provider's list stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    /// Never requested.
    #[default]
    Idle,
    /// A refresh is in flight.
    Loading,
    /// The list reflects the last successful fetch.
    Ready,
    /// The last refresh failed after retries; the list is the previous snapshot.
    Failed(String),
}

/// Current snapshot of one catalog list.
///
/// Resolution reads whatever snapshot is present, so an entry can resolve to
/// nothing while its list is still `Idle` or `Loading`.
#[derive(Debug, Clone)]
pub struct CatalogProvider<T> {
    items: Vec<T>,
    status: LoadStatus,
}

impl<T> Default for CatalogProvider<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: LoadStatus::Idle,
        }
    }
}

impl<T> CatalogProvider<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider already holding `items`, marked ready.
    #[must_use]
    pub const fn ready(items: Vec<T>) -> Self {
        Self {
            items,
            status: LoadStatus::Ready,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub const fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Error message of the last failed refresh, if that is the current state.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Mark a refresh as started.
    pub fn begin(&mut self) {
        self.status = LoadStatus::Loading;
    }

    /// Apply a refresh result: replace the list on success, keep it on failure.
    pub fn finish(&mut self, result: Result<Vec<T>, CatalogError>) {
        match result {
            Ok(items) => {
                self.items = items;
                self.status = LoadStatus::Ready;
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog refresh failed");
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
    }

    /// Run `fetch` and apply its result. Calling this again is the manual retry.
    pub async fn refresh<F, Fut>(&mut self, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, CatalogError>>,
    {
        self.begin();
        let result = fetch().await;
        self.finish(result);
    }
}

/// The three catalog lists of a session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub products: CatalogProvider<Product>,
    pub plans: CatalogProvider<Plan>,
    pub categories: CatalogProvider<Category>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh every list concurrently. Categories stay `Idle` when the
    /// client has no category endpoint.
    pub async fn refresh_all(&mut self, client: &CatalogClient) {
        let with_categories = client.has_categories();

        self.products.begin();
        self.plans.begin();
        if with_categories {
            self.categories.begin();
        }

        let (products, plans, categories) = tokio::join!(
            client.fetch_products(),
            client.fetch_plans(),
            async {
                if with_categories {
                    Some(client.fetch_categories().await)
                } else {
                    None
                }
            }
        );

        self.products.finish(products);
        self.plans.finish(plans);
        if let Some(categories) = categories {
            self.categories.finish(categories);
        }
    }

    /// Refresh only products.
    pub async fn refresh_products(&mut self, client: &CatalogClient) {
        self.products.refresh(|| client.fetch_products()).await;
    }

    /// Refresh only plans.
    pub async fn refresh_plans(&mut self, client: &CatalogClient) {
        self.plans.refresh(|| client.fetch_plans()).await;
    }

    /// Refresh only categories.
    pub async fn refresh_categories(&mut self, client: &CatalogClient) {
        self.categories.refresh(|| client.fetch_categories()).await;
    }

    /// Whether any list has a failed refresh outstanding.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.products.error().is_some()
            || self.plans.error().is_some()
            || self.categories.error().is_some()
    }
}
