// grocer/src/services/cart_service.rs

//! One cart per user, one row per (cart, product).
//!
//! Both invariants are backed by unique indexes and every write is a single
//! statement, so concurrent requests for the same user cannot duplicate the
//! cart or lose a quantity increment.

use crate::error::{GrocerError, Result};
use crate::models::cart::CART_ITEM_COLUMNS;
use crate::models::{Cart, CartItem, CartLine, CartView, MAX_ITEM_QUANTITY};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

fn validate_quantity(quantity: i64) -> Result<()> {
  if quantity <= 0 {
    warn!("Invalid quantity ({}) provided. Must be positive.", quantity);
    return Err(GrocerError::Validation("Quantity must be a positive number.".to_string()));
  }
  if quantity > MAX_ITEM_QUANTITY {
    warn!("Invalid quantity ({}) provided. Above the per-item cap.", quantity);
    return Err(quantity_over_cap());
  }
  Ok(())
}

fn quantity_over_cap() -> GrocerError {
  GrocerError::Validation(format!(
    "Quantity cannot exceed {} per product.",
    MAX_ITEM_QUANTITY
  ))
}

/// Returns the user's cart, creating it on first use.
#[instrument(name = "cart_service::get_or_create_cart", skip(pool), err(Display))]
pub async fn get_or_create_cart(pool: &SqlitePool, user_id: Uuid) -> Result<Cart> {
  let now = Utc::now();
  sqlx::query("INSERT INTO carts (id, user_id, created_at, updated_at) VALUES (?, ?, ?, ?) ON CONFLICT (user_id) DO NOTHING")
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

  let cart = sqlx::query_as::<_, Cart>("SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = ?")
    .bind(user_id)
    .fetch_one(pool)
    .await?;
  Ok(cart)
}

async fn find_cart(pool: &SqlitePool, user_id: Uuid) -> Result<Option<Cart>> {
  let cart = sqlx::query_as::<_, Cart>("SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = ?")
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
  Ok(cart)
}

async fn touch_cart(pool: &SqlitePool, cart_id: Uuid) -> Result<()> {
  sqlx::query("UPDATE carts SET updated_at = ? WHERE id = ?")
    .bind(Utc::now())
    .bind(cart_id)
    .execute(pool)
    .await?;
  Ok(())
}

pub(crate) const CART_LINES_SQL: &str = "SELECT ci.product_id, p.name AS product_name, p.price_cents AS unit_price_cents, \
   ci.quantity, \
   (SELECT url FROM product_images pi WHERE pi.product_id = p.id ORDER BY pi.is_primary DESC, pi.sort_order ASC LIMIT 1) AS primary_image, \
   p.price_cents * ci.quantity AS line_total_cents \
   FROM cart_items ci JOIN products p ON p.id = ci.product_id \
   WHERE ci.cart_id = ? ORDER BY ci.created_at ASC, p.name ASC";

/// Cart contents priced at the products' current prices.
#[instrument(name = "cart_service::get_cart", skip(pool), err(Display))]
pub async fn get_cart(pool: &SqlitePool, user_id: Uuid) -> Result<CartView> {
  let cart = get_or_create_cart(pool, user_id).await?;
  let lines = sqlx::query_as::<_, CartLine>(CART_LINES_SQL)
    .bind(cart.id)
    .fetch_all(pool)
    .await?;
  CartView::new(cart.id, lines)
}

/// Adds `quantity` units of a product. A second add of the same product
/// raises the existing row's quantity instead of inserting another row.
#[instrument(name = "cart_service::add_item", skip(pool), err(Display))]
pub async fn add_item(pool: &SqlitePool, user_id: Uuid, product_id: Uuid, quantity: i64) -> Result<CartItem> {
  validate_quantity(quantity)?;

  let product_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = ?)")
    .bind(product_id)
    .fetch_one(pool)
    .await?;
  if !product_exists {
    warn!("Product {} not found.", product_id);
    return Err(GrocerError::NotFound(format!("Product with ID {} not found.", product_id)));
  }

  let cart = get_or_create_cart(pool, user_id).await?;
  let now = Utc::now();
  let item = sqlx::query_as::<_, CartItem>(&format!(
    "INSERT INTO cart_items (id, cart_id, product_id, quantity, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) \
     ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = cart_items.quantity + excluded.quantity, \
     updated_at = excluded.updated_at WHERE cart_items.quantity + excluded.quantity <= ? RETURNING {}",
    CART_ITEM_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(cart.id)
  .bind(product_id)
  .bind(quantity)
  .bind(now)
  .bind(now)
  .bind(MAX_ITEM_QUANTITY)
  .fetch_optional(pool)
  .await?
  // No row back means the increment would pass the cap and was skipped.
  .ok_or_else(quantity_over_cap)?;

  touch_cart(pool, cart.id).await?;
  info!(cart_item_id = %item.id, new_quantity = item.quantity, "Cart item added or incremented.");
  Ok(item)
}

/// Sets the quantity of an existing row.
#[instrument(name = "cart_service::update_item", skip(pool), err(Display))]
pub async fn update_item(pool: &SqlitePool, user_id: Uuid, product_id: Uuid, quantity: i64) -> Result<CartItem> {
  validate_quantity(quantity)?;

  let not_found = || GrocerError::NotFound(format!("Product {} is not in the cart.", product_id));
  let cart = find_cart(pool, user_id).await?.ok_or_else(not_found)?;
  let item = sqlx::query_as::<_, CartItem>(&format!(
    "UPDATE cart_items SET quantity = ?, updated_at = ? WHERE cart_id = ? AND product_id = ? RETURNING {}",
    CART_ITEM_COLUMNS
  ))
  .bind(quantity)
  .bind(Utc::now())
  .bind(cart.id)
  .bind(product_id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(not_found)?;

  touch_cart(pool, cart.id).await?;
  Ok(item)
}

/// Removes one product from the cart. Returns `false` when the product was
/// not in the cart; that is not an error.
#[instrument(name = "cart_service::remove_item", skip(pool), err(Display))]
pub async fn remove_item(pool: &SqlitePool, user_id: Uuid, product_id: Uuid) -> Result<bool> {
  let Some(cart) = find_cart(pool, user_id).await? else {
    return Ok(false);
  };
  let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ? AND product_id = ?")
    .bind(cart.id)
    .bind(product_id)
    .execute(pool)
    .await?;
  let removed = result.rows_affected() > 0;
  if removed {
    touch_cart(pool, cart.id).await?;
  }
  Ok(removed)
}

/// Empties the cart and returns how many rows were removed.
#[instrument(name = "cart_service::clear_cart", skip(pool), err(Display))]
pub async fn clear_cart(pool: &SqlitePool, user_id: Uuid) -> Result<u64> {
  let result = sqlx::query("DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE user_id = ?)")
    .bind(user_id)
    .execute(pool)
    .await?;
  info!(removed = result.rows_affected(), "Cart cleared.");
  Ok(result.rows_affected())
}
