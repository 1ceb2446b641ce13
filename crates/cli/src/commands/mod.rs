//! Command implementations.
//!
//! Each command writes plain text to stdout; logs go to stderr.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod wishlist;

use solar_hive_storefront::catalog::LoadStatus;
use solar_hive_storefront::{AppError, Storefront};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Storefront operation failed.
    #[error(transparent)]
    App(#[from] AppError),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetch the catalog, warning about lists that could not be loaded.
///
/// A failed list is not fatal: cart entries it would have resolved simply
/// drop out of the output.
pub(crate) async fn load_catalog(storefront: &mut Storefront) {
    storefront.refresh_catalog().await;

    let catalog = storefront.catalog();
    for (name, status) in [
        ("products", catalog.products.status()),
        ("plans", catalog.plans.status()),
        ("categories", catalog.categories.status()),
    ] {
        if let LoadStatus::Failed(message) = status {
            tracing::warn!(list = name, error = %message, "catalog list unavailable");
        }
    }
}

/// Fail when a list the command depends on could not be loaded.
pub(crate) fn require_loaded(name: &str, status: &LoadStatus) -> Result<(), CommandError> {
    match status {
        LoadStatus::Failed(message) => Err(AppError::NotFound(format!(
            "{name} could not be loaded: {message}"
        ))
        .into()),
        _ => Ok(()),
    }
}
