// grocer/src/services/order_service.rs

//! Checkout and order lifecycle.

use crate::config::{AppConfig, ShippingPolicy};
use crate::error::{GrocerError, Result};
use crate::models::cart::amount_too_large;
use crate::models::order::ORDER_COLUMNS;
use crate::models::{CartLine, Order, OrderDetail, OrderItem, OrderStatus, OrderTotals, Page, PageRequest, ShippingAddress};
use crate::services::cart_service::CART_LINES_SQL;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

const ORDER_ITEM_COLUMNS: &str =
  "id, order_id, product_id, product_name, quantity, unit_price_cents, line_total_cents";

fn line_total(line: &CartLine) -> Result<i64> {
  line
    .unit_price_cents
    .checked_mul(line.quantity)
    .ok_or_else(amount_too_large)
}

/// Subtotal is the sum of unit price times quantity; shipping comes from the
/// policy and is added on top. Overflow is a validation error.
pub fn compute_totals(lines: &[CartLine], policy: &ShippingPolicy) -> Result<OrderTotals> {
  let mut subtotal_cents: i64 = 0;
  for line in lines {
    subtotal_cents = subtotal_cents
      .checked_add(line_total(line)?)
      .ok_or_else(amount_too_large)?;
  }
  let shipping_cents = policy.shipping_for(subtotal_cents);
  let total_cents = subtotal_cents
    .checked_add(shipping_cents)
    .ok_or_else(amount_too_large)?;
  Ok(OrderTotals {
    subtotal_cents,
    shipping_cents,
    total_cents,
  })
}

fn validate_address(address: &ShippingAddress) -> Result<()> {
  let required = [
    (&address.full_name, "Full name"),
    (&address.phone, "Phone"),
    (&address.address_line, "Address"),
    (&address.city, "City"),
  ];
  for (value, label) in required {
    if value.trim().is_empty() {
      return Err(GrocerError::Validation(format!("{} is required for delivery.", label)));
    }
  }
  Ok(())
}

async fn load_items(conn: &mut SqliteConnection, order_id: Uuid) -> Result<Vec<OrderItem>> {
  let items = sqlx::query_as::<_, OrderItem>(&format!(
    "SELECT {} FROM order_items WHERE order_id = ? ORDER BY product_name ASC",
    ORDER_ITEM_COLUMNS
  ))
  .bind(order_id)
  .fetch_all(conn)
  .await?;
  Ok(items)
}

/// Turns the user's cart into a `PENDING` order and empties the cart.
///
/// Names and prices are copied into the order items, so later catalog edits
/// do not change the order.
#[instrument(name = "order_service::place_order", skip(pool, config, address), err(Display))]
pub async fn place_order(
  pool: &SqlitePool,
  config: &AppConfig,
  user_id: Uuid,
  address: ShippingAddress,
) -> Result<OrderDetail> {
  validate_address(&address)?;

  let mut tx = pool.begin().await?;
  let cart_id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = ?")
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;
  let lines = match cart_id {
    Some(cart_id) => {
      sqlx::query_as::<_, CartLine>(CART_LINES_SQL)
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?
    }
    None => Vec::new(),
  };
  if lines.is_empty() {
    warn!("Checkout attempted with an empty cart.");
    return Err(GrocerError::Validation("Your cart is empty.".to_string()));
  }

  let totals = compute_totals(&lines, &config.shipping)?;
  let order_id = Uuid::new_v4();
  let now = Utc::now();
  let order = sqlx::query_as::<_, Order>(&format!(
    "INSERT INTO orders (id, user_id, status, subtotal_cents, shipping_cents, total_cents, \
     full_name, phone, address_line, city, note, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(order_id)
  .bind(user_id)
  .bind(OrderStatus::Pending.as_str())
  .bind(totals.subtotal_cents)
  .bind(totals.shipping_cents)
  .bind(totals.total_cents)
  .bind(address.full_name.trim())
  .bind(address.phone.trim())
  .bind(address.address_line.trim())
  .bind(address.city.trim())
  .bind(address.note.as_deref())
  .bind(now)
  .bind(now)
  .fetch_one(&mut *tx)
  .await?;

  for line in &lines {
    sqlx::query(
      "INSERT INTO order_items (id, order_id, product_id, product_name, quantity, unit_price_cents, line_total_cents) \
       VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(line.product_id)
    .bind(&line.product_name)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line_total(line)?)
    .execute(&mut *tx)
    .await?;
  }

  sqlx::query("DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE user_id = ?)")
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

  let items = load_items(&mut tx, order_id).await?;
  tx.commit().await?;
  info!(%order_id, total_cents = totals.total_cents, lines = items.len(), "Order placed.");
  Ok(OrderDetail { order, items })
}

pub async fn list_orders_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Order>> {
  let orders = sqlx::query_as::<_, Order>(&format!(
    "SELECT {} FROM orders WHERE user_id = ? ORDER BY created_at DESC",
    ORDER_COLUMNS
  ))
  .bind(user_id)
  .fetch_all(pool)
  .await?;
  Ok(orders)
}

async fn find_order(conn: &mut SqliteConnection, order_id: Uuid) -> Result<Order> {
  sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS))
    .bind(order_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| GrocerError::NotFound(format!("Order with ID {} not found.", order_id)))
}

/// Another user's order is reported as missing.
#[instrument(name = "order_service::get_order_for_user", skip(pool), err(Display))]
pub async fn get_order_for_user(pool: &SqlitePool, user_id: Uuid, order_id: Uuid) -> Result<OrderDetail> {
  let mut conn = pool.acquire().await?;
  let order = find_order(&mut conn, order_id).await?;
  if order.user_id != user_id {
    return Err(GrocerError::NotFound(format!("Order with ID {} not found.", order_id)));
  }
  let items = load_items(&mut conn, order_id).await?;
  Ok(OrderDetail { order, items })
}

pub async fn get_order(pool: &SqlitePool, order_id: Uuid) -> Result<OrderDetail> {
  let mut conn = pool.acquire().await?;
  let order = find_order(&mut conn, order_id).await?;
  let items = load_items(&mut conn, order_id).await?;
  Ok(OrderDetail { order, items })
}

async fn write_status(conn: &mut SqliteConnection, order: &Order, next: OrderStatus) -> Result<Order> {
  if !order.status.can_transition_to(next) {
    return Err(GrocerError::Validation(format!(
      "Order cannot move from {} to {}.",
      order.status, next
    )));
  }
  let updated = sqlx::query_as::<_, Order>(&format!(
    "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ? RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(next.as_str())
  .bind(Utc::now())
  .bind(order.id)
  .bind(order.status.as_str())
  .fetch_optional(conn)
  .await?
  .ok_or_else(|| GrocerError::Conflict("Order status changed concurrently; please retry.".to_string()))?;
  Ok(updated)
}

/// Customers can cancel their own orders while they are still `PENDING`.
#[instrument(name = "order_service::cancel_order", skip(pool), err(Display))]
pub async fn cancel_order(pool: &SqlitePool, user_id: Uuid, order_id: Uuid) -> Result<Order> {
  let mut tx = pool.begin().await?;
  let order = find_order(&mut tx, order_id).await?;
  if order.user_id != user_id {
    return Err(GrocerError::NotFound(format!("Order with ID {} not found.", order_id)));
  }
  if order.status != OrderStatus::Pending {
    return Err(GrocerError::Validation(format!(
      "Only pending orders can be cancelled; this order is {}.",
      order.status
    )));
  }
  let order = write_status(&mut tx, &order, OrderStatus::Cancelled).await?;
  tx.commit().await?;
  info!("Order cancelled by customer.");
  Ok(order)
}

#[instrument(name = "order_service::list_all_orders", skip(pool), err(Display))]
pub async fn list_all_orders(pool: &SqlitePool, status: Option<OrderStatus>, page: &PageRequest) -> Result<Page<Order>> {
  let (_, limit) = page.normalized();

  let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
  if let Some(status) = status {
    count_qb.push(" WHERE status = ").push_bind(status.as_str());
  }
  let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

  let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM orders", ORDER_COLUMNS));
  if let Some(status) = status {
    qb.push(" WHERE status = ").push_bind(status.as_str());
  }
  qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);
  qb.push(" OFFSET ").push_bind(page.offset());
  let orders: Vec<Order> = qb.build_query_as().fetch_all(pool).await?;

  Ok(Page::new(orders, page, total))
}

#[instrument(name = "order_service::update_status", skip(pool), err(Display))]
pub async fn update_status(pool: &SqlitePool, order_id: Uuid, next: OrderStatus) -> Result<Order> {
  let mut tx = pool.begin().await?;
  let order = find_order(&mut tx, order_id).await?;
  let updated = write_status(&mut tx, &order, next).await?;
  tx.commit().await?;
  info!(from = %order.status, to = %next, "Order status updated.");
  Ok(updated)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn line(price: i64, quantity: i64) -> CartLine {
    CartLine {
      product_id: Uuid::new_v4(),
      product_name: "Item".to_string(),
      unit_price_cents: price,
      quantity,
      primary_image: None,
      line_total_cents: price.saturating_mul(quantity),
    }
  }

  fn policy() -> ShippingPolicy {
    ShippingPolicy {
      flat_cents: 3000,
      free_threshold_cents: 50000,
    }
  }

  #[test]
  fn totals_add_shipping_below_threshold() {
    let totals = compute_totals(&[line(1250, 2), line(500, 3)], &policy()).unwrap();
    assert_eq!(totals.subtotal_cents, 4000);
    assert_eq!(totals.shipping_cents, 3000);
    assert_eq!(totals.total_cents, 7000);
  }

  #[test]
  fn totals_ship_free_at_threshold() {
    let totals = compute_totals(&[line(25000, 2)], &policy()).unwrap();
    assert_eq!(totals.shipping_cents, 0);
    assert_eq!(totals.total_cents, 50000);
  }

  #[test]
  fn totals_reject_overflow_instead_of_wrapping() {
    let huge = [line(5_000_000_000, 1_000_000_000), line(5_000_000_000, 1_000_000_000)];
    assert!(matches!(compute_totals(&huge, &policy()), Err(GrocerError::Validation(_))));
    let near_max = [line(i64::MAX, 1), line(1, 1)];
    assert!(matches!(compute_totals(&near_max, &policy()), Err(GrocerError::Validation(_))));
  }

  #[test]
  fn address_fields_are_required() {
    let mut address = ShippingAddress {
      full_name: "Ana".to_string(),
      phone: "0900".to_string(),
      address_line: "1 Main St".to_string(),
      city: "Hanoi".to_string(),
      note: None,
    };
    assert!(validate_address(&address).is_ok());
    address.city = "  ".to_string();
    assert!(validate_address(&address).is_err());
  }
}
