//! Checkout and payment verification commands.

use std::io::Write;

use clap::Args;
use solar_hive_core::Email;
use solar_hive_storefront::checkout::{CustomerDetails, FulfillmentMethod, PaymentStatus};
use solar_hive_storefront::{AppError, Storefront};

use super::cart::write_summary;
use super::{CommandError, load_catalog, require_loaded};

/// Customer details for the order.
#[derive(Debug, Args)]
pub struct CustomerArgs {
    /// Full name
    #[arg(long)]
    name: String,

    /// Email address
    #[arg(long)]
    email: String,

    /// Phone number
    #[arg(long)]
    phone: String,

    /// Country
    #[arg(long, default_value = "Nigeria")]
    country: String,

    /// State
    #[arg(long)]
    state: String,

    /// City
    #[arg(long)]
    city: String,

    /// Delivery address (not needed with --pickup)
    #[arg(long, default_value = "")]
    address: String,

    /// Collect the order instead of having it delivered
    #[arg(long)]
    pickup: bool,
}

impl TryFrom<CustomerArgs> for CustomerDetails {
    type Error = AppError;

    fn try_from(args: CustomerArgs) -> Result<Self, Self::Error> {
        let email = Email::parse(&args.email)
            .map_err(|e| AppError::InvalidInput(format!("email: {e}")))?;

        Ok(Self {
            full_name: args.name,
            email,
            phone: args.phone,
            country: args.country,
            city: args.city,
            state: args.state,
            address: args.address,
            fulfillment: if args.pickup {
                FulfillmentMethod::Pickup
            } else {
                FulfillmentMethod::Delivery
            },
        })
    }
}

/// Price the cart, send the order, and print where to pay.
pub async fn start(storefront: &mut Storefront, args: CustomerArgs) -> Result<(), CommandError> {
    let customer = CustomerDetails::try_from(args)?;

    load_catalog(storefront).await;
    require_loaded("products", storefront.catalog().products.status())?;
    require_loaded("plans", storefront.catalog().plans.status())?;

    let session = storefront.begin_checkout(customer).await?;

    let mut out = std::io::stdout().lock();
    write_summary(&mut out, &storefront.summary())?;
    writeln!(out)?;
    writeln!(out, "Order reference: {}", session.order.reference)?;
    if let Some(gateway_reference) = &session.redirect.reference {
        writeln!(out, "Gateway reference: {gateway_reference}")?;
    }
    writeln!(out, "Pay at: {}", session.redirect.url)?;
    Ok(())
}

/// Check a reference and report the payment state.
pub async fn verify(storefront: &mut Storefront, reference: &str) -> Result<(), CommandError> {
    let status = storefront.verify_payment(reference).await?;

    let mut out = std::io::stdout().lock();
    match status {
        PaymentStatus::Paid => writeln!(out, "Payment confirmed. Your cart has been cleared.")?,
        PaymentStatus::Unpaid(state) => writeln!(out, "Payment not confirmed (status: {state})")?,
    }
    Ok(())
}
