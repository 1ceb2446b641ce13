//! Session state: one storefront per shopper session.
//!
//! Constructed once from [`HiveConfig`] and a key-value store, then passed
//! by reference to whatever needs the cart, wishlist, or catalog.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::cart::{Cart, CartStorage};
use crate::catalog::{Catalog, CatalogClient};
use crate::checkout::{
    CheckoutSummary, CustomerDetails, OrderRequest, PaymentClient, PaymentRedirect, PaymentStatus,
};
use crate::config::HiveConfig;
use crate::error::{Result, add_breadcrumb};
use crate::resolve::{Resolution, resolve};
use crate::storage::{FileStore, KeyValueStore};
use crate::wishlist::Wishlist;

/// A started checkout: the order sent and where to pay for it.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub order: OrderRequest,
    pub redirect: PaymentRedirect,
}

/// Everything a shopper session needs.
pub struct Storefront {
    config: HiveConfig,
    cart: Cart,
    wishlist: Wishlist,
    catalog: Catalog,
    catalog_client: CatalogClient,
    payment: PaymentClient,
}

impl Storefront {
    /// Create a session over `store`.
    #[must_use]
    pub fn new(config: HiveConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let cart = Cart::load(CartStorage::new(Arc::clone(&store)));
        let wishlist = Wishlist::load(store);
        let catalog_client = CatalogClient::new(&config.catalog);
        let payment = PaymentClient::new(&config.payment);

        Self {
            config,
            cart,
            wishlist,
            catalog: Catalog::new(),
            catalog_client,
            payment,
        }
    }

    /// Create a session persisting to the configured state directory.
    #[must_use]
    pub fn open(config: HiveConfig) -> Self {
        let store = Arc::new(FileStore::new(config.state_dir.clone()));
        Self::new(config, store)
    }

    #[must_use]
    pub const fn config(&self) -> &HiveConfig {
        &self.config
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    #[must_use]
    pub const fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    pub const fn wishlist_mut(&mut self) -> &mut Wishlist {
        &mut self.wishlist
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub const fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    #[must_use]
    pub const fn catalog_client(&self) -> &CatalogClient {
        &self.catalog_client
    }

    /// Refresh products, plans, and (when configured) categories.
    pub async fn refresh_catalog(&mut self) {
        self.catalog.refresh_all(&self.catalog_client).await;
    }

    /// Join the cart to the current catalog snapshot.
    #[must_use]
    pub fn resolve(&self) -> Resolution<'_> {
        resolve(
            self.cart.entries(),
            self.catalog.products.items(),
            self.catalog.plans.items(),
            self.config.unresolved_policy,
        )
    }

    /// Price the resolved cart.
    #[must_use]
    pub fn summary(&self) -> CheckoutSummary {
        CheckoutSummary::from_resolution(&self.resolve(), self.config.currency)
    }

    /// Build the order payload without sending it.
    ///
    /// # Errors
    ///
    /// Returns an error when nothing resolves or customer details are incomplete.
    pub fn prepare_order(&self, customer: CustomerDetails) -> Result<OrderRequest> {
        Ok(OrderRequest::new(&self.summary(), customer)?)
    }

    /// Send the order to the payment backend and return the redirect.
    ///
    /// The cart is left untouched; it is cleared only once payment is confirmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is invalid or the payment backend fails.
    #[instrument(skip_all)]
    pub async fn begin_checkout(&self, customer: CustomerDetails) -> Result<CheckoutSession> {
        let order = self.prepare_order(customer)?;
        let reference = order.reference.to_string();
        add_breadcrumb("checkout", "Initiating payment", &[("reference", &reference)]);

        let redirect = self.payment.initiate(&order).await?;
        info!(reference = %reference, items = order.items.len(), "checkout started");
        Ok(CheckoutSession { order, redirect })
    }

    /// Check a payment reference; a paid order clears the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is malformed or the backend fails.
    pub async fn verify_payment(&mut self, reference: &str) -> Result<PaymentStatus> {
        let status = self.payment.verify(reference).await?;
        if status.is_paid() {
            info!(reference, "payment confirmed, clearing cart");
            self.cart.clear();
        }
        Ok(status)
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("cart", &self.cart)
            .field("wishlist", &self.wishlist)
            .field("catalog_client", &self.catalog_client)
            .finish_non_exhaustive()
    }
}
