//! Search, filter, and browse helpers over catalog snapshots.
//!
//! Two matching modes exist. Browse filters ([`filter_plans`],
//! [`filter_products`]) treat a blank query as "show everything"; the search
//! page ([`search`]) treats it as "nothing searched yet". Matching is a
//! case-insensitive substring test in both.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::{Plan, Product};

/// Plan and product hits for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults<'a> {
    pub plans: Vec<&'a Plan>,
    pub products: Vec<&'a Product>,
}

impl SearchResults<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty() && self.products.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len() + self.products.len()
    }
}

/// Lowercased, trimmed query; `None` when blank.
fn normalize_query(query: &str) -> Option<String> {
    let query = query.trim();
    (!query.is_empty()).then(|| query.to_lowercase())
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn any_contains(values: &[String], needle: &str) -> bool {
    values.iter().any(|v| contains(v, needle))
}

/// Search-page match for plans: title, description, or slug.
#[must_use]
pub fn search_plans<'a>(plans: &'a [Plan], query: &str) -> Vec<&'a Plan> {
    let Some(q) = normalize_query(query) else {
        return Vec::new();
    };
    plans
        .iter()
        .filter(|plan| {
            contains(&plan.title, &q) || contains(&plan.description, &q) || contains(plan.slug.as_str(), &q)
        })
        .collect()
}

/// Search-page match for products: name, description, or brand.
#[must_use]
pub fn search_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let Some(q) = normalize_query(query) else {
        return Vec::new();
    };
    products
        .iter()
        .filter(|product| {
            contains(&product.name, &q)
                || contains(&product.description, &q)
                || product.brand.as_deref().is_some_and(|brand| contains(brand, &q))
        })
        .collect()
}

/// Search both catalogs. A blank query finds nothing.
#[must_use]
pub fn search<'a>(plans: &'a [Plan], products: &'a [Product], query: &str) -> SearchResults<'a> {
    SearchResults {
        plans: search_plans(plans, query),
        products: search_products(products, query),
    }
}

/// Browse filter for plans: title, slug, description, or features.
#[must_use]
pub fn filter_plans<'a>(plans: &'a [Plan], query: &str) -> Vec<&'a Plan> {
    let Some(q) = normalize_query(query) else {
        return plans.iter().collect();
    };
    plans
        .iter()
        .filter(|plan| {
            contains(&plan.title, &q)
                || contains(plan.slug.as_str(), &q)
                || contains(&plan.description, &q)
                || any_contains(&plan.features, &q)
        })
        .collect()
}

/// Browse filter for products: name, category, description, or features.
#[must_use]
pub fn filter_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let Some(q) = normalize_query(query) else {
        return products.iter().collect();
    };
    products
        .iter()
        .filter(|product| {
            contains(&product.name, &q)
                || product.category.as_deref().is_some_and(|c| contains(c, &q))
                || contains(&product.description, &q)
                || any_contains(&product.features, &q)
        })
        .collect()
}

/// URL slug for a category name: lowercase, whitespace runs become `-`.
#[must_use]
pub fn category_slug(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Products whose category slugs to `slug`.
#[must_use]
pub fn products_in_category<'a>(products: &'a [Product], slug: &str) -> Vec<&'a Product> {
    let slug = slug.trim().to_lowercase();
    products
        .iter()
        .filter(|product| {
            product
                .category
                .as_deref()
                .is_some_and(|category| category_slug(category) == slug)
        })
        .collect()
}

/// Products grouped by category name, in order of first appearance.
/// Products without a category are left out.
#[must_use]
pub fn group_by_category(products: &[Product]) -> Vec<(&str, Vec<&Product>)> {
    let mut groups: Vec<(&str, Vec<&Product>)> = Vec::new();
    for product in products {
        let Some(category) = product.category.as_deref() else {
            continue;
        };
        match groups.iter_mut().find(|(name, _)| *name == category) {
            Some((_, members)) => members.push(product),
            None => groups.push((category, vec![product])),
        }
    }
    groups
}

/// Lowest normalized price, `None` for an empty list.
#[must_use]
pub fn starting_price<'a, I>(products: I) -> Option<Decimal>
where
    I: IntoIterator<Item = &'a Product>,
{
    products.into_iter().map(|p| p.price.amount()).min()
}

/// Up to `limit` plans other than `slug`, in catalog order.
#[must_use]
pub fn similar_plans<'a>(plans: &'a [Plan], slug: &str, limit: usize) -> Vec<&'a Plan> {
    plans
        .iter()
        .filter(|plan| plan.slug.as_str() != slug)
        .take(limit)
        .collect()
}
