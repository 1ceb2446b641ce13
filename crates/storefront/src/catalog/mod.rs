//! Remote catalog: products, plans, and categories.
//!
//! # Architecture
//!
//! - [`CatalogClient`] talks to the catalog REST API with `reqwest`
//! - Transient failures are retried with exponential backoff ([`RetryPolicy`])
//! - Fetched lists are cached in memory via `moka`
//! - [`CatalogProvider`] holds the current snapshot of one list plus its load
//!   status; [`Catalog`] groups the three providers for a session
//!
//! The API is the source of truth; lists are replaced wholesale on every
//! successful refresh and never mutated in place.

mod cache;
mod client;
mod provider;
pub mod types;

pub use client::{CatalogClient, RetryPolicy};
pub use provider::{Catalog, CatalogProvider, LoadStatus};
pub use types::{Category, Plan, Product};

use thiserror::Error;

/// Errors that can occur when fetching the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport failure or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response was JSON but not the expected list shape.
    #[error("Invalid catalog response: {0}")]
    InvalidFormat(String),

    /// The requested list has no endpoint configured.
    #[error("Not configured: {0}")]
    NotConfigured(&'static str),
}

impl CatalogError {
    /// Whether retrying the same request could succeed.
    ///
    /// Transport errors, timeouts, 5xx and 429 are transient; other statuses
    /// and malformed bodies are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Parse(_) | Self::InvalidFormat(_) | Self::NotConfigured(_) => false,
        }
    }
}
