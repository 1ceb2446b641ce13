//! Payment gateway handoff.
//!
//! The backend initiates the gateway transaction and answers with a URL the
//! customer is sent to. After payment the gateway redirects back with the
//! order reference, which can be checked against `GET {verify_url}/{reference}`.
//! Requests are never retried; initiation is not idempotent.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use super::OrderRequest;
use crate::config::PaymentConfig;

/// Response fields that may carry the redirect, in lookup order.
const REDIRECT_FIELDS: &[&str] = &["authorization_url", "redirect_url", "url"];

/// Errors that can occur when talking to the payment backend.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Response carried no redirect URL.
    #[error("Payment response has no redirect URL")]
    MissingRedirect,

    /// Reference contains characters that cannot go in a URL path.
    #[error("Invalid payment reference: {0}")]
    InvalidReference(String),
}

/// Where to send the customer to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRedirect {
    pub url: Url,
    /// Gateway reference, when the backend returns one.
    pub reference: Option<String>,
}

/// Outcome of a payment verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    /// Any other status the backend reports, verbatim.
    Unpaid(String),
}

impl PaymentStatus {
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

/// Client for order initiation and payment verification.
#[derive(Debug, Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    initiate_url: String,
    verify_url: String,
    timeout: Duration,
}

impl PaymentClient {
    /// Create a new payment client.
    #[must_use]
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            initiate_url: config.initiate_url.clone(),
            verify_url: config.verify_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        }
    }

    /// Send the order and get the gateway redirect.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the backend answers non-2xx, or
    /// the response has no usable redirect URL.
    #[instrument(skip(self, order), fields(reference = %order.reference, amount = %order.amount))]
    pub async fn initiate(&self, order: &OrderRequest) -> Result<PaymentRedirect, PaymentError> {
        let response = self
            .client
            .post(&self.initiate_url)
            .timeout(self.timeout)
            .json(order)
            .send()
            .await?;

        let body = read_json(response).await?;
        let redirect = extract_redirect(&body)?;
        info!(url = %redirect.url, "payment initiated");
        Ok(redirect)
    }

    /// Ask the backend whether an order reference has been paid.
    ///
    /// # Errors
    ///
    /// Returns error if the reference is malformed or the request fails.
    #[instrument(skip(self))]
    pub async fn verify(&self, reference: &str) -> Result<PaymentStatus, PaymentError> {
        let valid = !reference.is_empty()
            && reference
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
        if !valid {
            return Err(PaymentError::InvalidReference(reference.to_string()));
        }

        let url = format!("{}/{reference}", self.verify_url);
        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let body = read_json(response).await?;

        let status = body
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| PaymentError::Parse("verification response has no status".into()))?;
        Ok(if status.eq_ignore_ascii_case("paid") {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid(status.to_string())
        })
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, PaymentError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        warn!(
            status = %status,
            body = %text.chars().take(500).collect::<String>(),
            "Payment API returned non-success status"
        );
        return Err(PaymentError::Api {
            status: status.as_u16(),
            message: text.chars().take(200).collect(),
        });
    }

    serde_json::from_str(&text).map_err(|e| PaymentError::Parse(e.to_string()))
}

/// Pull the redirect URL from the response root or its `data` object.
fn extract_redirect(body: &Value) -> Result<PaymentRedirect, PaymentError> {
    let scopes = [Some(body), body.get("data")];
    for scope in scopes.into_iter().flatten() {
        let Some(raw) = REDIRECT_FIELDS
            .iter()
            .find_map(|field| scope.get(field).and_then(Value::as_str))
        else {
            continue;
        };

        let url = Url::parse(raw).map_err(|e| PaymentError::Parse(format!("redirect URL: {e}")))?;
        let reference = scope
            .get("reference")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Ok(PaymentRedirect { url, reference });
    }
    Err(PaymentError::MissingRedirect)
}
