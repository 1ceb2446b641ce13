//! Bee Solar Hive storefront library.
//!
//! Client-side commerce state for the solar storefront: the persisted cart
//! and wishlist, the remote catalog of products and subscription plans,
//! cart-to-catalog resolution, checkout totals, and the payment handoff.
//! Front ends (the `hive` CLI, tests) build one [`state::Storefront`] per
//! session and drive it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod resolve;
pub mod search;
pub mod state;
pub mod storage;
pub mod wishlist;

pub use error::{AppError, Result};
pub use state::{CheckoutSession, Storefront};
