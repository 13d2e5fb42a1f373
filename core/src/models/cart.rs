// grocer/src/models/cart.rs

use crate::error::{GrocerError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One cart per user.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
  pub id: Uuid,
  pub user_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// At most one row per (cart, product); repeated adds raise `quantity`.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub id: Uuid,
  pub cart_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Upper bound on one cart row's quantity.
pub const MAX_ITEM_QUANTITY: i64 = 1_000;

pub(crate) const CART_ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity, created_at, updated_at";

/// Cart row joined with the product's current name and price.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub product_id: Uuid,
  pub product_name: String,
  pub unit_price_cents: i64,
  pub quantity: i64,
  pub primary_image: Option<String>,
  pub line_total_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
  pub cart_id: Uuid,
  pub items: Vec<CartLine>,
  pub item_count: i64,
  pub subtotal_cents: i64,
}

impl CartView {
  /// Sums are checked; an overflowing cart is rejected instead of wrapping.
  pub fn new(cart_id: Uuid, items: Vec<CartLine>) -> Result<Self> {
    let mut item_count: i64 = 0;
    let mut subtotal_cents: i64 = 0;
    for line in &items {
      item_count = item_count.checked_add(line.quantity).ok_or_else(amount_too_large)?;
      subtotal_cents = subtotal_cents
        .checked_add(line.line_total_cents)
        .ok_or_else(amount_too_large)?;
    }
    Ok(Self {
      cart_id,
      items,
      item_count,
      subtotal_cents,
    })
  }
}

pub(crate) fn amount_too_large() -> GrocerError {
  GrocerError::Validation("The cart total is too large.".to_string())
}
