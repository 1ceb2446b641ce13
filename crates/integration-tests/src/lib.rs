//! Integration tests for Bee Solar Hive.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p solar-hive-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog_fetch` - HTTP catalog client: retries, caching, list decoding
//! - `cart_persistence` - Cart and wishlist state on disk across sessions
//! - `checkout_flow` - Catalog to cart to payment handoff and verification
//!
//! Network tests run against [`FakeApi`], an in-process `axum` server bound
//! to an ephemeral port. Each endpoint can be scripted to fail a number of
//! times before answering normally.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use solar_hive_storefront::config::HiveConfig;
use url::Url;

/// Fake API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Products,
    Plans,
    Categories,
    Initiate,
    Verify,
}

#[derive(Default)]
struct FakeState {
    products: Mutex<Value>,
    plans: Mutex<Value>,
    categories: Mutex<Value>,
    scripted: Mutex<HashMap<Endpoint, VecDeque<u16>>>,
    hits: Mutex<HashMap<Endpoint, u32>>,
    orders: Mutex<Vec<Value>>,
    payment_status: Mutex<String>,
    categories_token: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeState {
    /// Count the hit and return the scripted failure status, if any.
    fn hit(&self, endpoint: Endpoint) -> Option<Response> {
        *lock(&self.hits).entry(endpoint).or_insert(0) += 1;

        let status = lock(&self.scripted).get_mut(&endpoint)?.pop_front()?;
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Some((status, "scripted failure").into_response())
    }
}

/// In-process stand-in for the catalog and payment backend.
pub struct FakeApi {
    api_url: Url,
    categories_url: Url,
    state: Arc<FakeState>,
}

impl FakeApi {
    /// Start the server on an ephemeral port with an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(FakeState::default());
        *lock(&state.products) = json!([]);
        *lock(&state.plans) = json!([]);
        *lock(&state.categories) = json!({"list": []});
        *lock(&state.payment_status) = "pending".to_string();

        let router = Router::new()
            .route("/api/products", get(products))
            .route("/api/plans", get(plans))
            .route("/tables/categories", get(categories))
            .route("/api/payments/initiate", post(initiate))
            .route("/api/orders/verify/{reference}", get(verify))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "fake API stopped");
            }
        });

        let parse = |path: &str| {
            Url::parse(&format!("http://{addr}{path}"))
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        };

        Ok(Self {
            api_url: parse("/api")?,
            categories_url: parse("/tables/categories")?,
            state,
        })
    }

    /// Base URL serving `/products`, `/plans`, and the payment routes.
    #[must_use]
    pub const fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Configuration pointed at this server with millisecond backoff.
    #[must_use]
    pub fn config(&self) -> HiveConfig {
        let mut config = HiveConfig::for_api(self.api_url.clone());
        config.catalog.categories_url = Some(self.categories_url.clone());
        config.catalog.backoff_base = Duration::from_millis(5);
        config.catalog.timeout = Duration::from_secs(5);
        config.payment.timeout = Duration::from_secs(5);
        config
    }

    pub fn set_products(&self, products: Value) {
        *lock(&self.state.products) = products;
    }

    pub fn set_plans(&self, plans: Value) {
        *lock(&self.state.plans) = plans;
    }

    /// Set the category table response body as served (normally `{"list": [...]}`).
    pub fn set_categories(&self, body: Value) {
        *lock(&self.state.categories) = body;
    }

    /// Answer the next requests to `endpoint` with these statuses, in order.
    pub fn fail_next(&self, endpoint: Endpoint, statuses: &[u16]) {
        lock(&self.state.scripted)
            .entry(endpoint)
            .or_default()
            .extend(statuses.iter().copied());
    }

    /// Requests received by `endpoint`, failures included.
    #[must_use]
    pub fn hits(&self, endpoint: Endpoint) -> u32 {
        lock(&self.state.hits).get(&endpoint).copied().unwrap_or(0)
    }

    /// Order payloads received by the initiate endpoint.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        lock(&self.state.orders).clone()
    }

    /// Status the verify endpoint reports for every reference.
    pub fn set_payment_status(&self, status: &str) {
        *lock(&self.state.payment_status) = status.to_string();
    }

    /// `xc-token` header of the last category request.
    #[must_use]
    pub fn categories_token(&self) -> Option<String> {
        lock(&self.state.categories_token).clone()
    }
}

async fn products(State(state): State<Arc<FakeState>>) -> Response {
    if let Some(failure) = state.hit(Endpoint::Products) {
        return failure;
    }
    Json(lock(&state.products).clone()).into_response()
}

async fn plans(State(state): State<Arc<FakeState>>) -> Response {
    if let Some(failure) = state.hit(Endpoint::Plans) {
        return failure;
    }
    Json(lock(&state.plans).clone()).into_response()
}

async fn categories(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    *lock(&state.categories_token) = headers
        .get("xc-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Some(failure) = state.hit(Endpoint::Categories) {
        return failure;
    }
    Json(lock(&state.categories).clone()).into_response()
}

async fn initiate(State(state): State<Arc<FakeState>>, Json(order): Json<Value>) -> Response {
    if let Some(failure) = state.hit(Endpoint::Initiate) {
        return failure;
    }

    let reference = order
        .get("reference")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    lock(&state.orders).push(order);

    Json(json!({
        "status": true,
        "data": {
            "authorization_url": format!("https://checkout.test/pay/{reference}"),
            "reference": reference,
        }
    }))
    .into_response()
}

async fn verify(State(state): State<Arc<FakeState>>, Path(reference): Path<String>) -> Response {
    if let Some(failure) = state.hit(Endpoint::Verify) {
        return failure;
    }
    Json(json!({
        "reference": reference,
        "status": lock(&state.payment_status).clone(),
    }))
    .into_response()
}
