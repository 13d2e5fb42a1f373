// grocer/src/models/product_image.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
  pub id: Uuid,
  pub product_id: Uuid,
  pub url: String,
  pub is_primary: bool,
  pub sort_order: i64,
  pub created_at: DateTime<Utc>,
}

pub(crate) const IMAGE_COLUMNS: &str = "id, product_id, url, is_primary, sort_order, created_at";
