//! End-to-end checkout: catalog fetch, cart resolution, payment handoff,
//! and verification.
//!
//! Run with: `cargo test -p solar-hive-integration-tests --test checkout_flow`

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use solar_hive_core::{CartKey, Email};
use solar_hive_integration_tests::{Endpoint, FakeApi};
use solar_hive_storefront::checkout::{
    CheckoutError, CustomerDetails, FulfillmentMethod, PaymentError, PaymentStatus,
};
use solar_hive_storefront::config::HiveConfig;
use solar_hive_storefront::resolve::UnresolvedPolicy;
use solar_hive_storefront::storage::MemoryStore;
use solar_hive_storefront::{AppError, Storefront};

async fn stocked_api() -> FakeApi {
    let api = FakeApi::start().await.unwrap();
    api.set_products(json!([
        {"_id": "p1", "name": "Mono Panel 450W", "price": 1200},
        {"_id": "p2", "name": "Charge Controller", "price": "₦45,500.50"},
    ]));
    api.set_plans(json!([
        {"slug": "home-basic", "title": "Home Basic", "price": "25000"},
        {"slug": "p1", "title": "Plan sharing an id", "price": 9},
    ]));
    api
}

fn customer() -> CustomerDetails {
    CustomerDetails {
        full_name: "Chioma Eze".into(),
        email: Email::parse("chioma@example.ng").unwrap(),
        phone: "08031234567".into(),
        country: "Nigeria".into(),
        city: "Ikeja".into(),
        state: "Lagos".into(),
        address: "12 Allen Avenue".into(),
        fulfillment: FulfillmentMethod::Delivery,
    }
}

async fn storefront_for(config: HiveConfig) -> Storefront {
    let mut storefront = Storefront::new(config, Arc::new(MemoryStore::new()));
    storefront.refresh_catalog().await;
    storefront
}

// =============================================================================
// Resolution and totals
// =============================================================================

#[tokio::test]
async fn test_summary_prices_resolved_lines() {
    let api = stocked_api().await;
    let mut storefront = storefront_for(api.config()).await;
    for _ in 0..3 {
        storefront.cart_mut().add(CartKey::product("p1"));
    }
    storefront.cart_mut().add(CartKey::plan("home-basic"));

    let summary = storefront.summary();

    assert_eq!(summary.lines.len(), 2);
    assert_eq!(summary.lines[0].line_total, Decimal::from(3600));
    assert_eq!(summary.item_count, 4);
    assert_eq!(summary.subtotal, Decimal::from(28_600));
    assert_eq!(summary.total, summary.subtotal);
    assert_eq!(summary.formatted_total(), "₦28,600.00");
}

#[tokio::test]
async fn test_kind_disambiguates_shared_ids() {
    let api = stocked_api().await;
    let mut storefront = storefront_for(api.config()).await;
    storefront.cart_mut().add(CartKey::plan("p1"));
    storefront.cart_mut().add(CartKey::product("p1"));

    let summary = storefront.summary();

    assert_eq!(summary.lines[0].name, "Plan sharing an id");
    assert_eq!(summary.lines[1].name, "Mono Panel 450W");
    assert_eq!(summary.subtotal, Decimal::from(1209));
}

#[tokio::test]
async fn test_legacy_unknown_key_prefers_plans() {
    let api = stocked_api().await;
    let mut storefront = storefront_for(api.config()).await;
    storefront.cart_mut().set_quantity(&CartKey::unknown("p1"), 2);

    let summary = storefront.summary();

    assert_eq!(summary.lines[0].name, "Plan sharing an id");
    assert_eq!(summary.subtotal, Decimal::from(18));
}

#[tokio::test]
async fn test_flag_policy_reports_unavailable_items() {
    let api = stocked_api().await;
    let mut config = api.config();
    config.unresolved_policy = UnresolvedPolicy::Flag;
    let mut storefront = storefront_for(config).await;
    storefront.cart_mut().add(CartKey::product("p2"));
    storefront.cart_mut().add(CartKey::plan("retired-plan"));

    let summary = storefront.summary();

    assert_eq!(summary.lines.len(), 1);
    assert_eq!(summary.subtotal, "45500.50".parse::<Decimal>().unwrap());
    assert_eq!(summary.unavailable, vec![CartKey::plan("retired-plan")]);
}

// =============================================================================
// Payment handoff
// =============================================================================

#[tokio::test]
async fn test_begin_checkout_sends_order_and_returns_redirect() {
    let api = stocked_api().await;
    let mut storefront = storefront_for(api.config()).await;
    storefront.cart_mut().add(CartKey::product("p1"));
    storefront.cart_mut().add(CartKey::product("p1"));
    storefront.cart_mut().add(CartKey::plan("home-basic"));

    let session = storefront.begin_checkout(customer()).await.unwrap();

    let reference = session.order.reference.to_string();
    assert_eq!(
        session.redirect.url.as_str(),
        format!("https://checkout.test/pay/{reference}")
    );
    assert_eq!(session.redirect.reference.as_deref(), Some(reference.as_str()));

    let orders = api.orders();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order["amount"], json!(27_400.0));
    assert_eq!(order["currency"], "NGN");
    assert_eq!(order["customer"]["email"], "chioma@example.ng");
    assert_eq!(
        order["items"][0],
        json!({"id": "p1", "name": "Mono Panel 450W", "price": 1200.0, "qty": 2, "kind": "product"})
    );
    assert_eq!(order["items"][1]["kind"], "plan");

    // Starting checkout does not empty the cart.
    assert_eq!(storefront.cart().total_quantity(), 3);
}

#[tokio::test]
async fn test_empty_cart_is_rejected_before_any_request() {
    let api = stocked_api().await;
    let mut storefront = storefront_for(api.config()).await;
    storefront.cart_mut().add(CartKey::product("discontinued"));

    let err = storefront.begin_checkout(customer()).await.unwrap_err();

    assert!(matches!(err, AppError::Checkout(CheckoutError::EmptyCart)));
    assert!(err.is_user_error());
    assert_eq!(api.hits(Endpoint::Initiate), 0);
}

#[tokio::test]
async fn test_delivery_requires_address() {
    let api = stocked_api().await;
    let mut storefront = storefront_for(api.config()).await;
    storefront.cart_mut().add(CartKey::plan("home-basic"));
    let mut details = customer();
    details.address = "  ".into();

    let err = storefront.begin_checkout(details.clone()).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Checkout(CheckoutError::MissingField("address"))
    ));

    details.fulfillment = FulfillmentMethod::Pickup;
    assert!(storefront.begin_checkout(details).await.is_ok());
}

#[tokio::test]
async fn test_payment_backend_error_is_reported() {
    let api = stocked_api().await;
    api.fail_next(Endpoint::Initiate, &[502]);
    let mut storefront = storefront_for(api.config()).await;
    storefront.cart_mut().add(CartKey::plan("home-basic"));

    let err = storefront.begin_checkout(customer()).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Payment(PaymentError::Api { status: 502, .. })
    ));
    assert_eq!(api.hits(Endpoint::Initiate), 1);
    assert!(!storefront.cart().is_empty());
}

// =============================================================================
// Verification
// =============================================================================

#[tokio::test]
async fn test_paid_reference_clears_cart() {
    let api = stocked_api().await;
    let mut storefront = storefront_for(api.config()).await;
    storefront.cart_mut().add(CartKey::plan("home-basic"));
    let session = storefront.begin_checkout(customer()).await.unwrap();

    api.set_payment_status("pending");
    let reference = session.order.reference.to_string();
    let status = storefront.verify_payment(&reference).await.unwrap();
    assert_eq!(status, PaymentStatus::Unpaid("pending".into()));
    assert!(!storefront.cart().is_empty());

    api.set_payment_status("paid");
    let status = storefront.verify_payment(&reference).await.unwrap();
    assert!(status.is_paid());
    assert!(storefront.cart().is_empty());
}

#[tokio::test]
async fn test_malformed_reference_is_not_sent() {
    let api = stocked_api().await;
    let mut storefront = storefront_for(api.config()).await;

    let err = storefront.verify_payment("../admin").await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Payment(PaymentError::InvalidReference(_))
    ));
    assert_eq!(api.hits(Endpoint::Verify), 0);
}
