//! Checkout summary and the order payload handed to the payment gateway.
//!
//! Every amount goes through [`Price::amount`](solar_hive_core::Price::amount)
//! before any arithmetic, so formatted and numeric prices never mix.

mod payment;

pub use payment::{PaymentClient, PaymentError, PaymentRedirect, PaymentStatus};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solar_hive_core::{CartKey, CurrencyCode, Email, ItemKind};
use thiserror::Error;
use uuid::Uuid;

use crate::resolve::{Resolution, ResolvedLineItem};

/// Errors that can occur when preparing an order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Nothing in the cart resolved to a catalog item.
    #[error("Cart has no purchasable items")]
    EmptyCart,

    /// A required customer field is blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Prices and quantities multiply past the largest representable amount.
    #[error("Order total is too large to charge")]
    AmountOverflow,
}

// =============================================================================
// Totals
// =============================================================================

/// Normalized unit price times quantity, saturating at `Decimal::MAX`.
#[must_use]
pub fn line_total(line: &ResolvedLineItem<'_>) -> Decimal {
    line.item
        .price()
        .amount()
        .checked_mul(Decimal::from(line.quantity))
        .unwrap_or(Decimal::MAX)
}

/// Sum of line totals, saturating at `Decimal::MAX`.
#[must_use]
pub fn subtotal(lines: &[ResolvedLineItem<'_>]) -> Decimal {
    lines.iter().map(line_total).fold(Decimal::ZERO, saturating_add)
}

fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(Decimal::MAX)
}

/// Exact amount to charge, `None` when any step overflows.
fn checked_total(lines: &[SummaryLine], shipping: Decimal) -> Option<Decimal> {
    lines.iter().try_fold(shipping, |total, line| {
        line.unit_price
            .checked_mul(Decimal::from(line.quantity))
            .and_then(|line_total| total.checked_add(line_total))
    })
}

/// One priced line of the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub key: CartKey,
    /// Product id or plan slug.
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// Totals shown before payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSummary {
    pub lines: Vec<SummaryLine>,
    /// Sum of resolved quantities.
    pub item_count: u64,
    pub subtotal: Decimal,
    /// Always free.
    pub shipping: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
    /// Cart keys that matched nothing, when the policy reports them.
    pub unavailable: Vec<CartKey>,
}

impl CheckoutSummary {
    /// Price a resolved cart.
    #[must_use]
    pub fn from_resolution(resolution: &Resolution<'_>, currency: CurrencyCode) -> Self {
        let lines: Vec<SummaryLine> = resolution
            .lines
            .iter()
            .map(|line| SummaryLine {
                key: line.key.clone(),
                id: line.item.id().to_string(),
                name: line.item.name().to_string(),
                kind: line.kind,
                unit_price: line.item.price().amount(),
                quantity: line.quantity,
                line_total: line_total(line),
            })
            .collect();

        let subtotal = subtotal(&resolution.lines);
        let shipping = Decimal::ZERO;

        Self {
            item_count: lines.iter().map(|l| u64::from(l.quantity)).sum(),
            lines,
            subtotal,
            shipping,
            total: saturating_add(subtotal, shipping),
            currency,
            unavailable: resolution.unavailable.clone(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Format an amount in the summary's currency.
    #[must_use]
    pub fn format(&self, amount: Decimal) -> String {
        self.currency.format(amount)
    }

    #[must_use]
    pub fn formatted_subtotal(&self) -> String {
        self.format(self.subtotal)
    }

    #[must_use]
    pub fn formatted_total(&self) -> String {
        self.format(self.total)
    }
}

// =============================================================================
// Order payload
// =============================================================================

/// One line of the payment payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub qty: u32,
    pub kind: ItemKind,
}

impl From<&SummaryLine> for OrderItem {
    fn from(line: &SummaryLine) -> Self {
        Self {
            id: line.id.clone(),
            name: line.name.clone(),
            price: line.unit_price,
            qty: line.quantity,
            kind: line.kind,
        }
    }
}

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentMethod {
    #[default]
    Delivery,
    Pickup,
}

impl fmt::Display for FulfillmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Delivery => "delivery",
            Self::Pickup => "pickup",
        })
    }
}

impl FromStr for FulfillmentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delivery" => Ok(Self::Delivery),
            "pickup" => Ok(Self::Pickup),
            other => Err(format!("unknown fulfillment method: {other}")),
        }
    }
}

/// Customer form fields sent with the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub full_name: String,
    pub email: Email,
    pub phone: String,
    pub country: String,
    pub city: String,
    pub state: String,
    /// Required for delivery only.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub fulfillment: FulfillmentMethod,
}

impl CustomerDetails {
    /// Check that every required field has content.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingField` naming the first blank field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            ("full_name", &self.full_name),
            ("phone", &self.phone),
            ("country", &self.country),
            ("city", &self.city),
            ("state", &self.state),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CheckoutError::MissingField(field));
            }
        }

        if self.fulfillment == FulfillmentMethod::Delivery && self.address.trim().is_empty() {
            return Err(CheckoutError::MissingField("address"));
        }
        Ok(())
    }
}

/// Order initiation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Client-generated reference, echoed back on verification.
    pub reference: Uuid,
    pub created_at: DateTime<Utc>,
    pub customer: CustomerDetails,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: CurrencyCode,
}

impl OrderRequest {
    /// Build the payload for a priced cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` when no line resolved,
    /// `CheckoutError::MissingField` when customer details are incomplete, or
    /// `CheckoutError::AmountOverflow` when the total cannot be represented.
    pub fn new(summary: &CheckoutSummary, customer: CustomerDetails) -> Result<Self, CheckoutError> {
        if summary.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        customer.validate()?;
        let amount =
            checked_total(&summary.lines, summary.shipping).ok_or(CheckoutError::AmountOverflow)?;

        Ok(Self {
            reference: Uuid::new_v4(),
            created_at: Utc::now(),
            customer,
            items: summary.lines.iter().map(OrderItem::from).collect(),
            amount,
            currency: summary.currency,
        })
    }
}
