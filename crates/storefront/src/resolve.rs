//! Joining cart entries to the current catalog snapshot.
//!
//! Recomputed on every read, never stored. `Plan` keys match plans by slug,
//! `Product` keys match products by id, and legacy `Unknown` keys try plans
//! first, then products. An entry with no match contributes nothing; an
//! unloaded catalog and a deleted item look the same here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solar_hive_core::{CartKey, ItemKind, Price};
use thiserror::Error;

use crate::cart::CartEntry;
use crate::catalog::{Plan, Product};

/// What resolution does with entries that match no catalog item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Omit them silently.
    #[default]
    Drop,
    /// Omit them from the lines but report their keys.
    Flag,
}

impl fmt::Display for UnresolvedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drop => "drop",
            Self::Flag => "flag",
        })
    }
}

/// Error returned when parsing an unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown unresolved-item policy: {0} (expected drop or flag)")]
pub struct ParsePolicyError(String);

impl FromStr for UnresolvedPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "flag" => Ok(Self::Flag),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// A product or plan borrowed from the catalog snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogItem<'a> {
    Product(&'a Product),
    Plan(&'a Plan),
}

impl<'a> CatalogItem<'a> {
    /// Product id or plan slug.
    #[must_use]
    pub fn id(&self) -> &'a str {
        match self {
            Self::Product(product) => product.id.as_str(),
            Self::Plan(plan) => plan.slug.as_str(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'a str {
        match self {
            Self::Product(product) => &product.name,
            Self::Plan(plan) => &plan.title,
        }
    }

    #[must_use]
    pub const fn price(&self) -> &'a Price {
        match self {
            Self::Product(product) => &product.price,
            Self::Plan(plan) => &plan.price,
        }
    }

    #[must_use]
    pub fn image(&self) -> Option<&'a str> {
        match self {
            Self::Product(product) => product.image.as_deref(),
            Self::Plan(plan) => plan.image.as_deref(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Product(_) => ItemKind::Product,
            Self::Plan(_) => ItemKind::Plan,
        }
    }
}

/// A cart entry joined to its catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLineItem<'a> {
    /// Cart key the line came from.
    pub key: CartKey,
    pub item: CatalogItem<'a>,
    pub quantity: u32,
    /// Kind of the matched item; legacy entries learn theirs here.
    pub kind: ItemKind,
}

/// Result of resolving a whole cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Resolved lines in cart order.
    pub lines: Vec<ResolvedLineItem<'a>>,
    /// Keys with no catalog match; only filled under [`UnresolvedPolicy::Flag`].
    pub unavailable: Vec<CartKey>,
}

impl Resolution<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Find the catalog item a cart key refers to.
#[must_use]
pub fn lookup<'a>(key: &CartKey, products: &'a [Product], plans: &'a [Plan]) -> Option<CatalogItem<'a>> {
    let find_plan = || {
        plans
            .iter()
            .find(|plan| plan.slug.as_str() == key.id.as_str())
            .map(CatalogItem::Plan)
    };
    let find_product = || {
        products
            .iter()
            .find(|product| product.id.as_str() == key.id.as_str())
            .map(CatalogItem::Product)
    };

    match key.kind {
        ItemKind::Plan => find_plan(),
        ItemKind::Product => find_product(),
        ItemKind::Unknown => find_plan().or_else(find_product),
    }
}

/// Resolve every cart entry against the catalog snapshot.
#[must_use]
pub fn resolve<'a>(
    entries: &[CartEntry],
    products: &'a [Product],
    plans: &'a [Plan],
    policy: UnresolvedPolicy,
) -> Resolution<'a> {
    let mut resolution = Resolution::default();

    for entry in entries {
        match lookup(&entry.key, products, plans) {
            Some(item) => resolution.lines.push(ResolvedLineItem {
                key: entry.key.clone(),
                kind: item.kind(),
                item,
                quantity: entry.quantity,
            }),
            None => {
                tracing::debug!(key = %entry.key, ?policy, "cart entry has no catalog match");
                if policy == UnresolvedPolicy::Flag {
                    resolution.unavailable.push(entry.key.clone());
                }
            }
        }
    }

    resolution
}
