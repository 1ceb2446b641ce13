//! Wishlist commands.

use std::io::Write;

use solar_hive_core::{CartKey, ItemKind, PlanSlug, ProductId};
use solar_hive_storefront::{AppError, Storefront};

use super::{CommandError, load_catalog};

/// Print saved plans and products that are still in the catalog.
pub async fn show(storefront: &mut Storefront) -> Result<(), CommandError> {
    if storefront.wishlist().is_empty() {
        writeln!(std::io::stdout().lock(), "Your wishlist is empty")?;
        return Ok(());
    }

    load_catalog(storefront).await;
    let catalog = storefront.catalog();
    let wishlist = storefront.wishlist();
    let currency = storefront.config().currency;
    let mut out = std::io::stdout().lock();

    let plans = wishlist.resolve_plans(catalog.plans.items());
    writeln!(out, "Plans ({})", plans.len())?;
    for plan in plans {
        writeln!(
            out,
            "  plan/{:<27} {:<40} {:>16}",
            plan.slug.as_str(),
            plan.title,
            currency.format(plan.price.amount())
        )?;
    }

    let products = wishlist.resolve_products(catalog.products.items());
    writeln!(out, "Products ({})", products.len())?;
    for product in products {
        writeln!(
            out,
            "  product/{:<24} {:<40} {:>16}",
            product.id.as_str(),
            product.name,
            currency.format(product.price.amount())
        )?;
    }
    Ok(())
}

/// Save or unsave a plan or product.
pub fn toggle(storefront: &mut Storefront, key: CartKey) -> Result<(), CommandError> {
    let label = key.to_string();
    let added = match key.kind {
        ItemKind::Plan => storefront
            .wishlist_mut()
            .toggle_plan(PlanSlug::new(key.id.into_inner())),
        ItemKind::Product => storefront
            .wishlist_mut()
            .toggle_product(ProductId::new(key.id.into_inner())),
        ItemKind::Unknown => {
            return Err(AppError::InvalidInput(format!(
                "{label}: use plan/<slug> or product/<id>"
            ))
            .into());
        }
    };

    let state = if added { "saved" } else { "removed" };
    writeln!(std::io::stdout().lock(), "{label}: {state}")?;
    Ok(())
}

pub fn clear(storefront: &mut Storefront) -> Result<(), CommandError> {
    storefront.wishlist_mut().clear();
    writeln!(std::io::stdout().lock(), "Wishlist cleared")?;
    Ok(())
}
