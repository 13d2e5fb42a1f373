// grocer/src/models/product.rs

use super::{ProductImage, RatingSummary, VariantView};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Highest accepted unit price (one million in major units).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductType {
  pub id: i64,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub product_type_id: Option<i64>,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  /// True iff any variant of the product carries a size.
  pub has_size: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub(crate) const PRODUCT_COLUMNS: &str =
  "p.id, p.product_type_id, p.name, p.description, p.price_cents, p.has_size, p.created_at, p.updated_at";

/// Nutrition facts, at most one row per product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFacts {
  pub calories: Option<f64>,
  pub protein_g: Option<f64>,
  pub fat_g: Option<f64>,
  pub carbs_g: Option<f64>,
  pub sugar_g: Option<f64>,
  pub ingredients: Option<String>,
}

/// One row of the catalog listing.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub product: Product,
  pub type_name: Option<String>,
  pub primary_image: Option<String>,
  pub total_stock: i64,
  pub average_rating: Option<f64>,
  pub review_count: i64,
}

/// Everything the product page needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
  #[serde(flatten)]
  pub product: Product,
  pub product_type: Option<ProductType>,
  pub images: Vec<ProductImage>,
  pub variants: Vec<VariantView>,
  pub nutrition: Option<NutritionFacts>,
  pub rating: RatingSummary,
}

impl ProductDetail {
  pub fn total_stock(&self) -> i64 {
    self.variants.iter().map(|v| v.stock).sum()
  }
}
