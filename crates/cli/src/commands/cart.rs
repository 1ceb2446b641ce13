//! Cart commands.
//!
//! Mutations only touch local state; `show` fetches the catalog to price
//! the lines.

use std::io::Write;

use solar_hive_core::CartKey;
use solar_hive_storefront::Storefront;
use solar_hive_storefront::checkout::CheckoutSummary;

use super::{CommandError, load_catalog};

/// Print resolved lines and totals.
pub async fn show(storefront: &mut Storefront) -> Result<(), CommandError> {
    if storefront.cart().is_empty() {
        writeln!(std::io::stdout().lock(), "Your cart is empty")?;
        return Ok(());
    }

    load_catalog(storefront).await;
    let summary = storefront.summary();
    write_summary(&mut std::io::stdout().lock(), &summary)?;
    Ok(())
}

/// Write a summary as a small table.
pub(crate) fn write_summary(out: &mut impl Write, summary: &CheckoutSummary) -> std::io::Result<()> {
    writeln!(out, "Cart ({} items)", summary.item_count)?;
    for line in &summary.lines {
        writeln!(
            out,
            "  {:>3} x {:<40} {:>16} {:>16}  ({})",
            line.quantity,
            line.name,
            summary.format(line.unit_price),
            summary.format(line.line_total),
            line.key,
        )?;
    }
    writeln!(out, "Subtotal: {}", summary.formatted_subtotal())?;
    writeln!(out, "Shipping: Free")?;
    writeln!(out, "Total:    {}", summary.formatted_total())?;

    if !summary.unavailable.is_empty() {
        let keys: Vec<String> = summary.unavailable.iter().map(ToString::to_string).collect();
        writeln!(out, "No longer available: {}", keys.join(", "))?;
    }
    Ok(())
}

pub fn add(storefront: &mut Storefront, key: CartKey) -> Result<(), CommandError> {
    let label = key.to_string();
    let quantity = storefront.cart_mut().add(key);
    writeln!(std::io::stdout().lock(), "{label}: {quantity}")?;
    Ok(())
}

pub fn remove(storefront: &mut Storefront, key: &CartKey) -> Result<(), CommandError> {
    let quantity = storefront.cart_mut().remove(key);
    writeln!(std::io::stdout().lock(), "{key}: {quantity}")?;
    Ok(())
}

pub fn set(storefront: &mut Storefront, key: &CartKey, quantity: u32) -> Result<(), CommandError> {
    storefront.cart_mut().set_quantity(key, quantity);
    writeln!(
        std::io::stdout().lock(),
        "{key}: {}",
        storefront.cart().quantity_of(key)
    )?;
    Ok(())
}

pub fn delete(storefront: &mut Storefront, key: &CartKey) -> Result<(), CommandError> {
    let message = if storefront.cart_mut().delete(key) {
        format!("{key}: removed")
    } else {
        format!("{key}: not in cart")
    };
    writeln!(std::io::stdout().lock(), "{message}")?;
    Ok(())
}

pub fn clear(storefront: &mut Storefront) -> Result<(), CommandError> {
    storefront.cart_mut().clear();
    writeln!(std::io::stdout().lock(), "Cart cleared")?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use solar_hive_core::{CurrencyCode, ItemKind};
    use solar_hive_storefront::checkout::SummaryLine;

    use super::*;

    #[test]
    fn test_write_summary() {
        let summary = CheckoutSummary {
            lines: vec![SummaryLine {
                key: CartKey::product("p1"),
                id: "p1".into(),
                name: "Panel".into(),
                kind: ItemKind::Product,
                unit_price: Decimal::from(1200),
                quantity: 3,
                line_total: Decimal::from(3600),
            }],
            item_count: 3,
            subtotal: Decimal::from(3600),
            shipping: Decimal::ZERO,
            total: Decimal::from(3600),
            currency: CurrencyCode::NGN,
            unavailable: vec![CartKey::plan("retired")],
        };

        let mut out = Vec::new();
        write_summary(&mut out, &summary).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Cart (3 items)\n"));
        assert!(text.contains("₦3,600.00"));
        assert!(text.contains("(product/p1)"));
        assert!(text.contains("Total:    ₦3,600.00"));
        assert!(text.contains("No longer available: plan/retired"));
    }
}
