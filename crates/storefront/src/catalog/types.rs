//! Catalog item types.
//!
//! The products/plans API and the category table API are loosely typed:
//! ids arrive as `_id` or `id`, names as `name` or `title`, descriptions as a
//! string or a list of paragraphs. Each type decodes through a raw mirror
//! that accepts every observed spelling and then normalizes.

use serde::{Deserialize, Serialize};
use solar_hive_core::{CategoryId, PlanSlug, Price, ProductId};

use crate::search::category_slug;

/// A physical product from `GET /products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProduct")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
    pub features: Vec<String>,
    pub description: String,
    pub category: Option<String>,
    pub brand: Option<String>,
}

/// A subscription plan from `GET /plans`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPlan")]
pub struct Plan {
    pub slug: PlanSlug,
    pub title: String,
    pub price: Price,
    pub image: Option<String>,
    pub features: Vec<String>,
    pub description: String,
}

/// A product category from the category table API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCategory")]
pub struct Category {
    pub id: Option<CategoryId>,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
}

/// Free text that some records store as a list of paragraphs.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Description {
    Text(String),
    Lines(Vec<String>),
}

impl Description {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Lines(lines) => lines.join(" "),
        }
    }
}

fn text_of(description: Option<Description>) -> String {
    description.map(Description::into_text).unwrap_or_default()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Deserialize)]
struct RawProduct {
    #[serde(rename = "_id")]
    mongo_id: Option<ProductId>,
    id: Option<ProductId>,
    name: Option<String>,
    title: Option<String>,
    #[serde(default)]
    price: Price,
    image: Option<String>,
    #[serde(default)]
    features: Vec<String>,
    description: Option<Description>,
    category_name: Option<String>,
    #[serde(rename = "categoryName")]
    category_name_camel: Option<String>,
    category: Option<String>,
    category_title: Option<String>,
    brand: Option<String>,
}

impl TryFrom<RawProduct> for Product {
    type Error = String;

    fn try_from(raw: RawProduct) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .or(raw.mongo_id)
            .ok_or_else(|| "product has no id".to_string())?;
        Ok(Self {
            name: non_empty(raw.name)
                .or_else(|| non_empty(raw.title))
                .unwrap_or_else(|| id.to_string()),
            id,
            price: raw.price,
            image: non_empty(raw.image),
            features: raw.features,
            description: text_of(raw.description),
            category: non_empty(raw.category_name)
                .or_else(|| non_empty(raw.category_name_camel))
                .or_else(|| non_empty(raw.category))
                .or_else(|| non_empty(raw.category_title)),
            brand: non_empty(raw.brand),
        })
    }
}

#[derive(Deserialize)]
struct RawPlan {
    slug: Option<PlanSlug>,
    title: Option<String>,
    name: Option<String>,
    #[serde(default)]
    price: Price,
    image: Option<String>,
    #[serde(default)]
    features: Vec<String>,
    description: Option<Description>,
}

impl TryFrom<RawPlan> for Plan {
    type Error = String;

    fn try_from(raw: RawPlan) -> Result<Self, Self::Error> {
        let slug = raw
            .slug
            .filter(|s| !s.as_str().is_empty())
            .ok_or_else(|| "plan has no slug".to_string())?;
        Ok(Self {
            title: non_empty(raw.title)
                .or_else(|| non_empty(raw.name))
                .unwrap_or_else(|| slug.to_string()),
            slug,
            price: raw.price,
            image: non_empty(raw.image),
            features: raw.features,
            description: text_of(raw.description),
        })
    }
}

#[derive(Deserialize)]
struct RawCategory {
    id: Option<CategoryId>,
    #[serde(rename = "_id")]
    mongo_id: Option<CategoryId>,
    #[serde(rename = "Id")]
    table_id: Option<CategoryId>,
    pk: Option<CategoryId>,
    title: Option<String>,
    name: Option<String>,
    #[serde(rename = "Title")]
    table_title: Option<String>,
    #[serde(rename = "Name")]
    table_name: Option<String>,
    slug: Option<String>,
    description: Option<Description>,
    #[serde(rename = "Description")]
    table_description: Option<Description>,
    image: Option<String>,
    #[serde(rename = "Image")]
    table_image: Option<String>,
}

impl TryFrom<RawCategory> for Category {
    type Error = String;

    fn try_from(raw: RawCategory) -> Result<Self, Self::Error> {
        let title = non_empty(raw.title)
            .or_else(|| non_empty(raw.name))
            .or_else(|| non_empty(raw.table_title))
            .or_else(|| non_empty(raw.table_name))
            .ok_or_else(|| "category has no title".to_string())?;
        Ok(Self {
            id: raw.id.or(raw.mongo_id).or(raw.table_id).or(raw.pk),
            slug: non_empty(raw.slug).unwrap_or_else(|| category_slug(&title)),
            title,
            description: text_of(raw.description.or(raw.table_description)),
            image: non_empty(raw.image).or_else(|| non_empty(raw.table_image)),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_from_backend_record() {
        let product: Product = serde_json::from_value(json!({
            "_id": "64f0aa",
            "name": "5kVA Hybrid Inverter",
            "price": "₦1,250,000",
            "image": "https://cdn.test/inverter.png",
            "features": ["Pure sine wave", "MPPT"],
            "description": ["Quiet.", "Efficient."],
            "category_name": "Inverters"
        }))
        .unwrap();

        assert_eq!(product.id.as_str(), "64f0aa");
        assert_eq!(product.price.amount(), Decimal::from(1_250_000));
        assert_eq!(product.description, "Quiet. Efficient.");
        assert_eq!(product.category.as_deref(), Some("Inverters"));
    }

    #[test]
    fn test_product_numeric_id_and_title_fallback() {
        let product: Product =
            serde_json::from_value(json!({"id": 7, "title": "Panel", "price": 90000})).unwrap();
        assert_eq!(product.id.as_str(), "7");
        assert_eq!(product.name, "Panel");
        assert_eq!(product.price, Price::Numeric(Decimal::from(90_000)));
        assert!(product.features.is_empty());
    }

    #[test]
    fn test_product_without_id_is_rejected() {
        assert!(serde_json::from_value::<Product>(json!({"name": "Orphan"})).is_err());
    }

    #[test]
    fn test_plan_requires_slug() {
        let plan: Plan = serde_json::from_value(json!({
            "slug": "home-basic",
            "title": "Home Basic",
            "price": "₦25,000",
            "features": ["2 panels"]
        }))
        .unwrap();
        assert_eq!(plan.slug.as_str(), "home-basic");
        assert_eq!(plan.title, "Home Basic");

        assert!(serde_json::from_value::<Plan>(json!({"title": "No slug"})).is_err());
        assert!(serde_json::from_value::<Plan>(json!({"slug": ""})).is_err());
    }

    #[test]
    fn test_category_table_spelling() {
        let category: Category = serde_json::from_value(json!({
            "Id": 3,
            "Title": "Solar Panels",
            "Description": "Mono and poly",
            "Image": "https://cdn.test/panels.png"
        }))
        .unwrap();

        assert_eq!(category.id, Some(CategoryId::new("3")));
        assert_eq!(category.title, "Solar Panels");
        assert_eq!(category.slug, "solar-panels");
        assert_eq!(category.description, "Mono and poly");
    }
}
