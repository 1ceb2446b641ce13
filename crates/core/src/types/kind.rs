//! Item kinds and the composite cart key.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use super::id::ItemId;

/// Which catalog a cart entry belongs to.
///
/// Products and subscription plans live in separate catalogs whose id spaces
/// may overlap. `Unknown` marks entries written before the kind was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A physical product, matched by product id.
    Product,
    /// A subscription plan, matched by plan slug.
    Plan,
    /// Kind was never recorded (legacy carts).
    #[default]
    Unknown,
}

impl ItemKind {
    /// Returns the kind as its persisted name, or `None` for [`ItemKind::Unknown`].
    #[must_use]
    pub const fn as_known_str(self) -> Option<&'static str> {
        match self {
            Self::Product => Some("product"),
            Self::Plan => Some("plan"),
            Self::Unknown => None,
        }
    }

    /// Returns `true` unless the kind is [`ItemKind::Unknown`].
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Plan => write!(f, "plan"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Error returned when parsing an [`ItemKind`] from text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid item kind: {0}")]
pub struct ParseItemKindError(String);

impl FromStr for ItemKind {
    type Err = ParseItemKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(Self::Product),
            "plan" => Ok(Self::Plan),
            "unknown" | "" => Ok(Self::Unknown),
            other => Err(ParseItemKindError(other.to_owned())),
        }
    }
}

/// Composite cart identity: the catalog kind plus the id within that catalog.
///
/// A product and a plan that happen to share an id are distinct keys.
/// Serializes as its display form, `plan/<slug>`, `product/<id>`, or the
/// bare id when the kind is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartKey {
    /// Catalog the id belongs to.
    pub kind: ItemKind,
    /// Product id or plan slug.
    pub id: ItemId,
}

impl CartKey {
    /// Create a key of the given kind.
    #[must_use]
    pub fn new(kind: ItemKind, id: impl Into<ItemId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Key for a product id.
    #[must_use]
    pub fn product(id: impl Into<ItemId>) -> Self {
        Self::new(ItemKind::Product, id)
    }

    /// Key for a plan slug.
    #[must_use]
    pub fn plan(slug: impl Into<ItemId>) -> Self {
        Self::new(ItemKind::Plan, slug)
    }

    /// Key whose kind was never recorded.
    #[must_use]
    pub fn unknown(id: impl Into<ItemId>) -> Self {
        Self::new(ItemKind::Unknown, id)
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_known_str() {
            Some(kind) => write!(f, "{kind}/{}", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

impl Serialize for CartKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_from_str() {
        assert_eq!("plan".parse::<ItemKind>().unwrap(), ItemKind::Plan);
        assert_eq!("Product".parse::<ItemKind>().unwrap(), ItemKind::Product);
        assert_eq!("".parse::<ItemKind>().unwrap(), ItemKind::Unknown);
        assert!("bundle".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_item_kind_serde_names() {
        assert_eq!(serde_json::to_string(&ItemKind::Plan).unwrap(), "\"plan\"");
        let kind: ItemKind = serde_json::from_str("\"product\"").unwrap();
        assert_eq!(kind, ItemKind::Product);
    }

    #[test]
    fn test_cart_key_display() {
        assert_eq!(CartKey::plan("home-basic").to_string(), "plan/home-basic");
        assert_eq!(CartKey::product("7").to_string(), "product/7");
        assert_eq!(CartKey::unknown("7").to_string(), "7");
    }

    #[test]
    fn test_cart_key_serializes_as_display_form() {
        let keys = vec![CartKey::plan("home-basic"), CartKey::product("7"), CartKey::unknown("42")];
        assert_eq!(
            serde_json::to_value(&keys).unwrap(),
            serde_json::json!(["plan/home-basic", "product/7", "42"])
        );
    }

    #[test]
    fn test_same_id_different_kind_are_distinct() {
        assert_ne!(CartKey::plan("7"), CartKey::product("7"));
    }
}
