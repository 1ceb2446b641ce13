//! Bee Solar Hive Core - Shared storefront types.
//!
//! This crate provides the types used across the Bee Solar Hive components:
//! - `storefront` - Cart, catalog, checkout, and wishlist logic
//! - `cli` - Command-line surface over the storefront
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, item kinds, cart keys, prices, currencies, emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
