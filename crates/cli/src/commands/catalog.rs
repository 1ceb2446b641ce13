//! Catalog browsing and search commands.

use std::io::Write;

use solar_hive_core::{CartKey, CurrencyCode};
use solar_hive_storefront::catalog::{Plan, Product};
use solar_hive_storefront::{AppError, Storefront, search};

use super::{CommandError, load_catalog, require_loaded};

/// How many similar plans `catalog plan` shows.
const SIMILAR_PLANS: usize = 3;

fn product_line(out: &mut impl Write, product: &Product, currency: CurrencyCode) -> std::io::Result<()> {
    writeln!(
        out,
        "  product/{:<24} {:<40} {:>16}  {}",
        product.id.as_str(),
        product.name,
        currency.format(product.price.amount()),
        product.category.as_deref().unwrap_or("-"),
    )
}

fn plan_line(out: &mut impl Write, plan: &Plan, currency: CurrencyCode) -> std::io::Result<()> {
    writeln!(
        out,
        "  plan/{:<27} {:<40} {:>16}",
        plan.slug.as_str(),
        plan.title,
        currency.format(plan.price.amount()),
    )
}

/// List products, optionally narrowed by category slug and filter text.
pub async fn products(
    storefront: &mut Storefront,
    category: Option<&str>,
    filter: Option<&str>,
) -> Result<(), CommandError> {
    load_catalog(storefront).await;
    let catalog = storefront.catalog();
    require_loaded("products", catalog.products.status())?;

    let in_category: Vec<Product> = match category {
        Some(slug) => search::products_in_category(catalog.products.items(), slug)
            .into_iter()
            .cloned()
            .collect(),
        None => catalog.products.items().to_vec(),
    };
    let matches = search::filter_products(&in_category, filter.unwrap_or_default());

    let currency = storefront.config().currency;
    let mut out = std::io::stdout().lock();
    writeln!(out, "Products ({})", matches.len())?;
    for product in matches {
        product_line(&mut out, product, currency)?;
    }
    Ok(())
}

/// List plans, optionally narrowed by filter text.
pub async fn plans(storefront: &mut Storefront, filter: Option<&str>) -> Result<(), CommandError> {
    load_catalog(storefront).await;
    let catalog = storefront.catalog();
    require_loaded("plans", catalog.plans.status())?;

    let matches = search::filter_plans(catalog.plans.items(), filter.unwrap_or_default());

    let currency = storefront.config().currency;
    let mut out = std::io::stdout().lock();
    writeln!(out, "Plans ({})", matches.len())?;
    for plan in matches {
        plan_line(&mut out, plan, currency)?;
    }
    Ok(())
}

/// Show one plan in full, followed by similar plans.
pub async fn plan(storefront: &mut Storefront, slug: &str) -> Result<(), CommandError> {
    load_catalog(storefront).await;
    let catalog = storefront.catalog();
    require_loaded("plans", catalog.plans.status())?;

    let plans = catalog.plans.items();
    let plan = plans
        .iter()
        .find(|p| p.slug.as_str() == slug)
        .ok_or_else(|| AppError::NotFound(format!("plan {slug}")))?;

    let currency = storefront.config().currency;
    let in_cart = storefront.cart().quantity_of(&CartKey::plan(slug));
    let mut out = std::io::stdout().lock();
    writeln!(out, "{} ({})", plan.title, plan.slug)?;
    writeln!(out, "Price: {}", currency.format(plan.price.amount()))?;
    if !plan.description.is_empty() {
        writeln!(out, "{}", plan.description)?;
    }
    for feature in &plan.features {
        writeln!(out, "  - {feature}")?;
    }
    if in_cart > 0 {
        writeln!(out, "In cart: {in_cart}")?;
    }

    let similar = search::similar_plans(plans, slug, SIMILAR_PLANS);
    if !similar.is_empty() {
        writeln!(out, "\nSimilar plans")?;
        for other in similar {
            plan_line(&mut out, other, currency)?;
        }
    }
    Ok(())
}

/// List categories with the lowest price among their products.
pub async fn categories(storefront: &mut Storefront) -> Result<(), CommandError> {
    load_catalog(storefront).await;
    let catalog = storefront.catalog();
    let currency = storefront.config().currency;
    let products = catalog.products.items();
    let mut out = std::io::stdout().lock();

    if catalog.categories.items().is_empty() {
        // Without a category table, derive categories from the products.
        let groups = search::group_by_category(products);
        writeln!(out, "Categories ({})", groups.len())?;
        for (name, members) in groups {
            let from = search::starting_price(members.iter().copied())
                .map_or_else(|| "-".to_string(), |p| currency.format(p));
            writeln!(
                out,
                "  {:<32} {:>4} items  from {from}",
                search::category_slug(name),
                members.len()
            )?;
        }
        return Ok(());
    }

    writeln!(out, "Categories ({})", catalog.categories.items().len())?;
    for category in catalog.categories.items() {
        let members = search::products_in_category(products, &category.slug);
        let from = search::starting_price(members.iter().copied())
            .map_or_else(|| "-".to_string(), |p| currency.format(p));
        writeln!(
            out,
            "  {:<32} {:<28} {:>4} items  from {from}",
            category.slug,
            category.title,
            members.len()
        )?;
    }
    Ok(())
}

/// Search plans and products; a blank query finds nothing.
pub async fn search(storefront: &mut Storefront, query: &str) -> Result<(), CommandError> {
    load_catalog(storefront).await;
    let catalog = storefront.catalog();
    let results = search::search(catalog.plans.items(), catalog.products.items(), query);

    let currency = storefront.config().currency;
    let mut out = std::io::stdout().lock();
    if results.is_empty() {
        writeln!(out, "No results for {query:?}")?;
        return Ok(());
    }

    writeln!(out, "Plans ({})", results.plans.len())?;
    for plan in &results.plans {
        plan_line(&mut out, plan, currency)?;
    }
    writeln!(out, "Products ({})", results.products.len())?;
    for product in &results.products {
        product_line(&mut out, product, currency)?;
    }
    Ok(())
}
