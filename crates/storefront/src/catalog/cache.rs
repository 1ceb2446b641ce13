//! Cache types for catalog lists.

use std::sync::Arc;

use super::types::{Category, Plan, Product};

/// Cache key, one per list endpoint.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Plans,
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Plans(Arc<Vec<Plan>>),
    Categories(Arc<Vec<Category>>),
}
