// grocer/src/models/product_variant.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Size {
  pub id: i64,
  pub name: String,
}

/// A product's size/stock combination.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
  pub id: Uuid,
  pub product_id: Uuid,
  pub size_id: Option<i64>,
  pub stock: i64,
  pub created_at: DateTime<Utc>,
}

/// Variant joined with its size name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VariantView {
  pub id: Uuid,
  pub size_id: Option<i64>,
  pub size_name: Option<String>,
  pub stock: i64,
}

/// Variant as supplied by an admin. `stock` is required; it is optional here
/// only so that a missing value surfaces as a validation error instead of a
/// body-parsing error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVariant {
  pub size_id: Option<i64>,
  pub stock: Option<i64>,
}
