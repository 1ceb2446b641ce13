//! Saved-for-later lists of products and plans.
//!
//! Persisted under [`Wishlist::KEY`] as
//! `{"products": ["42"], "plans": ["home-basic"]}`. Loading fails soft like
//! the cart; every toggle persists the whole document.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use solar_hive_core::{PlanSlug, ProductId};

use crate::catalog::{Plan, Product};
use crate::storage::{self, KeyValueStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct WishlistState {
    #[serde(default)]
    products: Vec<ProductId>,
    #[serde(default)]
    plans: Vec<PlanSlug>,
}

/// Product and plan wishlists, in the order items were saved.
pub struct Wishlist {
    state: WishlistState,
    store: Arc<dyn KeyValueStore>,
}

impl Wishlist {
    /// Storage key holding the serialized wishlist.
    pub const KEY: &'static str = "wishlist";

    /// Load the stored wishlist; bad data is an empty wishlist.
    #[must_use]
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mut state: WishlistState = storage::load_json(store.as_ref(), Self::KEY);
        dedup(&mut state.products);
        dedup(&mut state.plans);
        Self { state, store }
    }

    /// Add or remove a product. Returns `true` when it was added.
    pub fn toggle_product(&mut self, id: ProductId) -> bool {
        let added = toggle(&mut self.state.products, id);
        self.persist();
        added
    }

    /// Add or remove a plan. Returns `true` when it was added.
    pub fn toggle_plan(&mut self, slug: PlanSlug) -> bool {
        let added = toggle(&mut self.state.plans, slug);
        self.persist();
        added
    }

    #[must_use]
    pub fn contains_product(&self, id: &ProductId) -> bool {
        self.state.products.contains(id)
    }

    #[must_use]
    pub fn contains_plan(&self, slug: &PlanSlug) -> bool {
        self.state.plans.contains(slug)
    }

    #[must_use]
    pub fn products(&self) -> &[ProductId] {
        &self.state.products
    }

    #[must_use]
    pub fn plans(&self) -> &[PlanSlug] {
        &self.state.plans
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.products.len() + self.state.plans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Saved products still present in the catalog, in wishlist order.
    #[must_use]
    pub fn resolve_products<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        self.state
            .products
            .iter()
            .filter_map(|id| products.iter().find(|p| &p.id == id))
            .collect()
    }

    /// Saved plans still present in the catalog, in wishlist order.
    #[must_use]
    pub fn resolve_plans<'a>(&self, plans: &'a [Plan]) -> Vec<&'a Plan> {
        self.state
            .plans
            .iter()
            .filter_map(|slug| plans.iter().find(|p| &p.slug == slug))
            .collect()
    }

    /// Empty both lists and remove the stored document.
    pub fn clear(&mut self) {
        self.state = WishlistState::default();
        storage::remove_value(self.store.as_ref(), Self::KEY);
    }

    fn persist(&self) {
        storage::save_json(self.store.as_ref(), Self::KEY, &self.state);
    }
}

impl fmt::Debug for Wishlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wishlist")
            .field("products", &self.state.products)
            .field("plans", &self.state.plans)
            .finish_non_exhaustive()
    }
}

fn toggle<T: PartialEq>(items: &mut Vec<T>, item: T) -> bool {
    if let Some(index) = items.iter().position(|existing| *existing == item) {
        items.remove(index);
        false
    } else {
        items.push(item);
        true
    }
}

fn dedup<T: PartialEq>(items: &mut Vec<T>) {
    let mut seen: Vec<T> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    *items = seen;
}
