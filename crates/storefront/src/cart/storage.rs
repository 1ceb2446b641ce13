//! Cart persistence and legacy-format migration.
//!
//! The cart is stored as one JSON object under [`CartStorage::KEY`]:
//!
//! ```json
//! {
//!   "plan/home-basic": { "quantity": 1, "kind": "plan" },
//!   "product/42": { "quantity": 3, "kind": "product" }
//! }
//! ```
//!
//! Older clients wrote bare ids with either a bare count (`{"42": 3}`) or an
//! object with `qty` and `type` (`{"42": {"qty": 3, "type": "product"}}`).
//! Those are migrated on load; values that cannot carry a positive quantity
//! are dropped. Object order is cart order.
//!
//! Entries of unknown kind are written under their bare id with
//! `"kind": null`, and that key is read back verbatim, prefix or not.

use std::fmt;
use std::sync::Arc;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solar_hive_core::{CartKey, ItemKind};

use super::CartEntry;
use crate::storage::{self, KeyValueStore};

/// Persistent store adapter for the cart.
#[derive(Clone)]
pub struct CartStorage {
    store: Arc<dyn KeyValueStore>,
}

impl CartStorage {
    /// Storage key holding the serialized cart.
    pub const KEY: &'static str = "cartItems";

    /// Bind the cart to a key-value store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load and migrate the stored cart. Never fails; bad data is an empty cart.
    #[must_use]
    pub fn load(&self) -> Vec<CartEntry> {
        storage::load_json::<PersistedCart>(self.store.as_ref(), Self::KEY).0
    }

    /// Overwrite the stored cart with `entries`.
    pub fn save(&self, entries: &[CartEntry]) {
        storage::save_json(self.store.as_ref(), Self::KEY, &PersistedCartRef(entries));
    }

    /// Remove the stored cart entirely.
    pub fn clear(&self) {
        storage::remove_value(self.store.as_ref(), Self::KEY);
    }
}

impl fmt::Debug for CartStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStorage")
            .field("key", &Self::KEY)
            .finish_non_exhaustive()
    }
}

/// Stored value in the current format.
#[derive(Serialize)]
struct StoredEntry {
    quantity: u32,
    kind: Option<&'static str>,
}

/// Borrowed view used for writing.
struct PersistedCartRef<'a>(&'a [CartEntry]);

impl Serialize for PersistedCartRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(
                &entry.key.to_string(),
                &StoredEntry {
                    quantity: entry.quantity,
                    kind: entry.key.kind.as_known_str(),
                },
            )?;
        }
        map.end()
    }
}

/// Owned, migrated cart used for reading.
#[derive(Debug, Default)]
struct PersistedCart(Vec<CartEntry>);

impl<'de> Deserialize<'de> for PersistedCart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CartVisitor;

        impl<'de> Visitor<'de> for CartVisitor {
            type Value = PersistedCart;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object of cart entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PersistedCart, A::Error> {
                let mut entries: Vec<CartEntry> = Vec::new();
                while let Some((raw_key, value)) = access.next_entry::<String, Value>()? {
                    let Some(entry) = migrate_entry(&raw_key, &value) else {
                        tracing::debug!(key = %raw_key, "dropping unusable stored cart entry");
                        continue;
                    };
                    match entries.iter_mut().find(|e| e.key == entry.key) {
                        Some(existing) => {
                            existing.quantity = existing.quantity.saturating_add(entry.quantity);
                        }
                        None => entries.push(entry),
                    }
                }
                Ok(PersistedCart(entries))
            }
        }

        deserializer.deserialize_map(CartVisitor)
    }
}

/// Convert one stored `(key, value)` pair, in any historical format.
fn migrate_entry(raw_key: &str, value: &Value) -> Option<CartEntry> {
    let mut explicit_unknown = false;
    let (quantity, stored_kind) = match value {
        Value::Number(n) => (n.as_u64()?, ItemKind::Unknown),
        Value::Object(fields) => {
            let quantity = fields
                .get("qty")
                .filter(|v| !v.is_null())
                .or_else(|| fields.get("quantity"))
                .and_then(Value::as_u64)?;
            let kind = fields
                .get("kind")
                .filter(|v| !v.is_null())
                .or_else(|| fields.get("type"))
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
            // Current-format entries write `"kind": null` for unknown kinds;
            // their key is the bare id even when it contains a `/`.
            explicit_unknown = fields.get("kind").is_some_and(Value::is_null);
            (quantity, kind)
        }
        _ => return None,
    };

    let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
    if quantity == 0 {
        return None;
    }

    let key = if explicit_unknown {
        CartKey::unknown(raw_key)
    } else {
        parse_key(raw_key, stored_kind)
    };
    if key.id.as_str().is_empty() {
        return None;
    }
    Some(CartEntry { key, quantity })
}

/// Split a stored key into kind and id. A kind prefix wins over the value's kind.
fn parse_key(raw_key: &str, stored_kind: ItemKind) -> CartKey {
    if let Some((prefix, id)) = raw_key.split_once('/') {
        match prefix {
            "plan" => return CartKey::plan(id),
            "product" => return CartKey::product(id),
            _ => {}
        }
    }
    CartKey::new(stored_kind, raw_key)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn storage_with(raw: &str) -> CartStorage {
        let store = Arc::new(MemoryStore::new());
        store.set(CartStorage::KEY, raw).unwrap();
        CartStorage::new(store)
    }

    fn entry(key: CartKey, quantity: u32) -> CartEntry {
        CartEntry { key, quantity }
    }

    #[test]
    fn test_load_missing_blob_is_empty() {
        let storage = CartStorage::new(Arc::new(MemoryStore::new()));
        assert!(storage.load().is_empty());
    }

    #[test]
    fn test_load_malformed_blob_is_empty() {
        assert!(storage_with("{not json").load().is_empty());
        assert!(storage_with("[1, 2, 3]").load().is_empty());
        assert!(storage_with("null").load().is_empty());
    }

    #[test]
    fn test_migrates_bare_integer_values() {
        let entries = storage_with(r#"{"x": 2}"#).load();
        assert_eq!(entries, vec![entry(CartKey::unknown("x"), 2)]);
    }

    #[test]
    fn test_migrates_qty_and_type_objects() {
        let entries = storage_with(
            r#"{"home-basic": {"qty": 1, "type": "plan"}, "42": {"quantity": 3, "type": null}}"#,
        )
        .load();
        assert_eq!(
            entries,
            vec![entry(CartKey::plan("home-basic"), 1), entry(CartKey::unknown("42"), 3)]
        );
    }

    #[test]
    fn test_drops_values_without_positive_quantity() {
        let entries = storage_with(
            r#"{"a": 0, "b": -1, "c": "3", "d": {"type": "plan"}, "e": [1], "f": {"qty": 2}}"#,
        )
        .load();
        assert_eq!(entries, vec![entry(CartKey::unknown("f"), 2)]);
    }

    #[test]
    fn test_preserves_document_order() {
        let entries = storage_with(r#"{"z": 1, "a": 1, "m": 1}"#).load();
        let ids: Vec<&str> = entries.iter().map(|e| e.key.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_prefix_wins_and_duplicates_merge() {
        let entries = storage_with(
            r#"{"plan/solar-max": {"quantity": 1, "kind": "product"}, "solar-max": {"qty": 2, "type": "plan"}}"#,
        )
        .load();
        assert_eq!(entries, vec![entry(CartKey::plan("solar-max"), 3)]);
    }

    #[test]
    fn test_unknown_ids_with_kind_prefix_round_trip() {
        let storage = CartStorage::new(Arc::new(MemoryStore::new()));
        let entries = vec![
            entry(CartKey::unknown("plan/x"), 1),
            entry(CartKey::unknown("product/y"), 2),
            entry(CartKey::plan("z"), 3),
        ];
        storage.save(&entries);
        assert_eq!(storage.load(), entries);
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let storage = CartStorage::new(Arc::new(MemoryStore::new()));
        let entries = vec![
            entry(CartKey::product("7"), 2),
            entry(CartKey::plan("7"), 1),
            entry(CartKey::unknown("legacy"), 4),
        ];
        storage.save(&entries);
        assert_eq!(storage.load(), entries);
    }

    #[test]
    fn test_saved_format() {
        let store = Arc::new(MemoryStore::new());
        let storage = CartStorage::new(store.clone());
        storage.save(&[entry(CartKey::product("42"), 3), entry(CartKey::unknown("x"), 1)]);

        let raw: Value = serde_json::from_str(&store.get(CartStorage::KEY).unwrap().unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({
                "product/42": {"quantity": 3, "kind": "product"},
                "x": {"quantity": 1, "kind": null}
            })
        );
    }

    #[test]
    fn test_clear_removes_blob() {
        let store = Arc::new(MemoryStore::new());
        let storage = CartStorage::new(store.clone());
        storage.save(&[entry(CartKey::product("1"), 1)]);
        storage.clear();
        assert_eq!(store.get(CartStorage::KEY).unwrap(), None);
        assert!(storage.load().is_empty());
    }
}
