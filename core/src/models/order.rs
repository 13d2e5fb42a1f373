// grocer/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stored as upper-case text in `orders.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pending,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Processing => "PROCESSING",
      OrderStatus::Shipped => "SHIPPED",
      OrderStatus::Delivered => "DELIVERED",
      OrderStatus::Cancelled => "CANCELLED",
    }
  }

  /// Forward-only lifecycle; cancellation is possible until the order ships.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (Pending, Processing)
        | (Processing, Shipped)
        | (Shipped, Delivered)
        | (Pending, Cancelled)
        | (Processing, Cancelled)
    )
  }

  pub fn is_final(self) -> bool {
    matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "PENDING" => Ok(OrderStatus::Pending),
      "PROCESSING" => Ok(OrderStatus::Processing),
      "SHIPPED" => Ok(OrderStatus::Shipped),
      "DELIVERED" => Ok(OrderStatus::Delivered),
      "CANCELLED" => Ok(OrderStatus::Cancelled),
      other => Err(format!("unknown order status '{}'", other)),
    }
  }
}

impl TryFrom<String> for OrderStatus {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  #[sqlx(try_from = "String")]
  pub status: OrderStatus,
  pub subtotal_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
  pub full_name: String,
  pub phone: String,
  pub address_line: String,
  pub city: String,
  pub note: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub(crate) const ORDER_COLUMNS: &str = "id, user_id, status, subtotal_cents, shipping_cents, total_cents, \
   full_name, phone, address_line, city, note, created_at, updated_at";

/// Line item with the product name and price captured at purchase time.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i64,
  pub unit_price_cents: i64,
  pub line_total_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  pub full_name: String,
  pub phone: String,
  pub address_line: String,
  pub city: String,
  pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
  pub subtotal_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
}

#[cfg(test)]
mod tests {
  use super::OrderStatus::*;
  use super::*;

  #[test]
  fn lifecycle_moves_forward_only() {
    assert!(Pending.can_transition_to(Processing));
    assert!(Processing.can_transition_to(Shipped));
    assert!(Shipped.can_transition_to(Delivered));
    assert!(!Shipped.can_transition_to(Processing));
    assert!(!Delivered.can_transition_to(Pending));
    assert!(!Pending.can_transition_to(Delivered));
  }

  #[test]
  fn cancellation_stops_at_shipping() {
    assert!(Pending.can_transition_to(Cancelled));
    assert!(Processing.can_transition_to(Cancelled));
    assert!(!Shipped.can_transition_to(Cancelled));
    assert!(!Cancelled.can_transition_to(Pending));
  }

  #[test]
  fn status_text_matches_storage_format() {
    assert_eq!("SHIPPED".parse::<OrderStatus>(), Ok(Shipped));
    assert!("shipped".parse::<OrderStatus>().is_err());
    assert_eq!(serde_json::to_string(&Cancelled).unwrap(), "\"CANCELLED\"");
  }
}
