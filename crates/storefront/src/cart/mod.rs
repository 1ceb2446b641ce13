//! Client-side cart aggregate.
//!
//! The cart is the authoritative record of what the shopper intends to buy:
//! an insertion-ordered list of [`CartEntry`] values keyed by [`CartKey`].
//! Every mutation is written through to [`CartStorage`] in full.
//!
//! # Key matching
//!
//! Entries migrated from old carts have [`ItemKind::Unknown`]. Lookups try
//! the exact key first; a known-kind key then falls back to an unknown-kind
//! entry with the same id, and an unknown-kind key falls back to the first
//! entry with that id. [`Cart::add`] with a known kind upgrades a matched
//! unknown-kind entry; it never changes an established kind.
//!
//! # Invariant
//!
//! No entry ever holds a quantity of zero.

mod storage;

pub use storage::CartStorage;

use solar_hive_core::{CartKey, ItemId, ItemKind};
use tracing::debug;

/// One distinct item the shopper has chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEntry {
    /// Catalog kind and id.
    pub key: CartKey,
    /// Number of units, always at least 1.
    pub quantity: u32,
}

impl CartEntry {
    /// Kind recorded for this entry.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.key.kind
    }
}

/// The shopper's cart.
#[derive(Debug)]
pub struct Cart {
    entries: Vec<CartEntry>,
    storage: CartStorage,
}

impl Cart {
    /// Load the cart from storage, migrating older formats.
    #[must_use]
    pub fn load(storage: CartStorage) -> Self {
        let entries = storage.load();
        debug!(entries = entries.len(), "cart loaded");
        Self { entries, storage }
    }

    /// Add one unit. Returns the new quantity.
    pub fn add(&mut self, key: CartKey) -> u32 {
        let quantity = match self.position(&key) {
            Some(index) => {
                let Some(entry) = self.entries.get_mut(index) else {
                    return 0;
                };
                if !entry.key.kind.is_known() {
                    entry.key.kind = key.kind;
                }
                entry.quantity = entry.quantity.saturating_add(1);
                entry.quantity
            }
            None => {
                self.entries.push(CartEntry { key, quantity: 1 });
                1
            }
        };
        self.persist("add");
        quantity
    }

    /// Remove one unit, deleting the entry when none remain.
    ///
    /// Returns the remaining quantity. Removing an absent item is a no-op.
    pub fn remove(&mut self, key: &CartKey) -> u32 {
        let Some(index) = self.position(key) else {
            return 0;
        };
        let remaining = match self.entries.get_mut(index) {
            Some(entry) if entry.quantity > 1 => {
                entry.quantity -= 1;
                entry.quantity
            }
            _ => {
                self.entries.remove(index);
                0
            }
        };
        self.persist("remove");
        remaining
    }

    /// Set an explicit quantity. Zero deletes the entry.
    ///
    /// Existing entries keep their kind; new entries take `key.kind`.
    pub fn set_quantity(&mut self, key: &CartKey, quantity: u32) {
        if quantity == 0 {
            self.delete(key);
            return;
        }
        match self.position(key).and_then(|index| self.entries.get_mut(index)) {
            Some(entry) => entry.quantity = quantity,
            None => self.entries.push(CartEntry {
                key: key.clone(),
                quantity,
            }),
        }
        self.persist("set_quantity");
    }

    /// Remove an entry regardless of quantity. Returns whether it existed.
    pub fn delete(&mut self, key: &CartKey) -> bool {
        let Some(index) = self.position(key) else {
            return false;
        };
        self.entries.remove(index);
        self.persist("delete");
        true
    }

    /// Empty the cart and remove the stored blob.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.storage.clear();
        debug!("cart cleared");
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.quantity)).sum()
    }

    /// Quantity held for `key`, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, key: &CartKey) -> u32 {
        self.find(key).map_or(0, |e| e.quantity)
    }

    /// Kind of the first entry with `id`, [`ItemKind::Unknown`] when absent.
    #[must_use]
    pub fn kind_of(&self, id: &ItemId) -> ItemKind {
        self.entries
            .iter()
            .find(|e| e.key.id == *id)
            .map_or(ItemKind::Unknown, CartEntry::kind)
    }

    /// Whether `key` is in the cart.
    #[must_use]
    pub fn contains(&self, key: &CartKey) -> bool {
        self.find(key).is_some()
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Number of distinct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, key: &CartKey) -> Option<&CartEntry> {
        self.position(key).and_then(|index| self.entries.get(index))
    }

    fn position(&self, key: &CartKey) -> Option<usize> {
        self.entries.iter().position(|e| e.key == *key).or_else(|| {
            if key.kind.is_known() {
                self.entries
                    .iter()
                    .position(|e| e.key.kind == ItemKind::Unknown && e.key.id == key.id)
            } else {
                self.entries.iter().position(|e| e.key.id == key.id)
            }
        })
    }

    fn persist(&self, operation: &'static str) {
        debug!(
            operation,
            entries = self.entries.len(),
            total = self.total_quantity(),
            "cart updated"
        );
        self.storage.save(&self.entries);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn empty_cart() -> (Cart, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cart = Cart::load(CartStorage::new(store.clone()));
        (cart, store)
    }

    fn cart_from(raw: &str) -> Cart {
        let store = Arc::new(MemoryStore::new());
        store.set(CartStorage::KEY, raw).unwrap();
        Cart::load(CartStorage::new(store))
    }

    fn reload(store: &Arc<MemoryStore>) -> Cart {
        Cart::load(CartStorage::new(store.clone()))
    }

    #[test]
    fn test_add_creates_then_increments() {
        let (mut cart, _) = empty_cart();
        assert_eq!(cart.add(CartKey::product("p1")), 1);
        assert_eq!(cart.add(CartKey::product("p1")), 2);
        assert_eq!(cart.quantity_of(&CartKey::product("p1")), 2);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_same_id_in_both_catalogs_stays_separate() {
        let (mut cart, _) = empty_cart();
        cart.add(CartKey::product("solar-max"));
        cart.add(CartKey::plan("solar-max"));
        cart.add(CartKey::plan("solar-max"));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantity_of(&CartKey::product("solar-max")), 1);
        assert_eq!(cart.quantity_of(&CartKey::plan("solar-max")), 2);
    }

    #[test]
    fn test_add_supplies_missing_kind_but_never_overwrites() {
        let mut cart = cart_from(r#"{"x": 2}"#);
        assert_eq!(cart.kind_of(&ItemId::new("x")), ItemKind::Unknown);

        cart.add(CartKey::plan("x"));
        assert_eq!(cart.kind_of(&ItemId::new("x")), ItemKind::Plan);
        assert_eq!(cart.quantity_of(&CartKey::plan("x")), 3);

        cart.add(CartKey::unknown("x"));
        assert_eq!(cart.kind_of(&ItemId::new("x")), ItemKind::Plan);
        assert_eq!(cart.quantity_of(&CartKey::plan("x")), 4);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_remove_deletes_at_zero() {
        let (mut cart, _) = empty_cart();
        let key = CartKey::product("p1");
        cart.add(key.clone());
        cart.add(key.clone());

        assert_eq!(cart.remove(&key), 1);
        assert_eq!(cart.remove(&key), 0);
        assert!(!cart.contains(&key));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (mut cart, store) = empty_cart();
        assert_eq!(cart.remove(&CartKey::product("ghost")), 0);
        assert_eq!(store.get(CartStorage::KEY).unwrap(), None);
    }

    #[test]
    fn test_add_then_remove_restores_prior_state() {
        let (mut cart, store) = empty_cart();
        cart.add(CartKey::plan("home-basic"));
        cart.set_quantity(&CartKey::product("9"), 4);
        let before = cart.entries().to_vec();

        let key = CartKey::product("new");
        cart.add(key.clone());
        cart.remove(&key);

        assert_eq!(cart.entries(), before.as_slice());
        assert_eq!(reload(&store).entries(), before.as_slice());
    }

    #[test]
    fn test_set_quantity_upserts_and_keeps_kind() {
        let mut cart = cart_from(r#"{"x": {"qty": 1, "type": null}}"#);
        cart.set_quantity(&CartKey::product("x"), 5);
        assert_eq!(cart.kind_of(&ItemId::new("x")), ItemKind::Unknown);
        assert_eq!(cart.quantity_of(&CartKey::unknown("x")), 5);

        cart.set_quantity(&CartKey::plan("new-plan"), 2);
        assert_eq!(cart.kind_of(&ItemId::new("new-plan")), ItemKind::Plan);
        assert_eq!(cart.quantity_of(&CartKey::plan("new-plan")), 2);
    }

    #[test]
    fn test_set_quantity_zero_deletes() {
        let (mut cart, _) = empty_cart();
        let key = CartKey::product("p1");
        cart.add(key.clone());
        cart.set_quantity(&key, 0);
        assert!(!cart.contains(&key));
    }

    #[test]
    fn test_delete() {
        let (mut cart, _) = empty_cart();
        let key = CartKey::product("p1");
        cart.set_quantity(&key, 7);
        assert!(cart.delete(&key));
        assert!(!cart.delete(&key));
        assert_eq!(cart.total_quantity(), 0);
    }

    #[test]
    fn test_no_entry_ever_holds_zero() {
        let (mut cart, store) = empty_cart();
        let keys = [
            CartKey::product("a"),
            CartKey::plan("a"),
            CartKey::product("b"),
            CartKey::unknown("c"),
        ];

        // Deterministic pseudo-random walk over every operation.
        let mut seed: u64 = 0x5eed;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let key = &keys[usize::try_from(seed >> 62).unwrap()];
            match (seed >> 40) % 4 {
                0 => {
                    cart.add(key.clone());
                }
                1 => {
                    cart.remove(key);
                }
                2 => cart.set_quantity(key, u32::try_from((seed >> 20) % 4).unwrap()),
                _ => {
                    cart.delete(key);
                }
            }
            assert!(cart.entries().iter().all(|e| e.quantity > 0));
            assert_eq!(
                cart.total_quantity(),
                cart.entries().iter().map(|e| u64::from(cart.quantity_of(&e.key))).sum::<u64>()
            );
        }

        assert_eq!(reload(&store).entries(), cart.entries());
    }

    #[test]
    fn test_total_quantity() {
        let (mut cart, _) = empty_cart();
        cart.add(CartKey::product("a"));
        cart.set_quantity(&CartKey::plan("b"), 3);
        cart.add(CartKey::product("a"));
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_mutations_write_through() {
        let (mut cart, store) = empty_cart();
        cart.add(CartKey::plan("home-basic"));
        cart.set_quantity(&CartKey::product("42"), 2);

        let reloaded = reload(&store);
        assert_eq!(reloaded.entries(), cart.entries());
        assert_eq!(reloaded.quantity_of(&CartKey::product("42")), 2);
    }

    #[test]
    fn test_legacy_bare_integer() {
        let cart = cart_from(r#"{"x": 2}"#);
        assert_eq!(cart.quantity_of(&CartKey::unknown("x")), 2);
        assert_eq!(cart.kind_of(&ItemId::new("x")), ItemKind::Unknown);
    }

    #[test]
    fn test_legacy_round_trip() {
        let store = Arc::new(MemoryStore::new());
        store.set(CartStorage::KEY, r#"{"x": 2, "y": {"qty": 1, "type": "product"}}"#).unwrap();
        let cart = Cart::load(CartStorage::new(store.clone()));

        let mut touched = Cart::load(CartStorage::new(store.clone()));
        touched.add(CartKey::product("y"));
        touched.remove(&CartKey::product("y"));

        assert_eq!(reload(&store).entries(), cart.entries());
    }

    #[test]
    fn test_clear_empties_memory_and_storage() {
        let (mut cart, store) = empty_cart();
        cart.add(CartKey::product("a"));
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(store.get(CartStorage::KEY).unwrap(), None);
        assert!(reload(&store).is_empty());
    }

    #[test]
    fn test_unknown_key_matches_any_kind() {
        let (mut cart, _) = empty_cart();
        cart.add(CartKey::plan("p"));
        assert_eq!(cart.quantity_of(&CartKey::unknown("p")), 1);
        assert!(cart.delete(&CartKey::unknown("p")));
    }
}
