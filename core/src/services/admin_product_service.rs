// grocer/src/services/admin_product_service.rs

//! Catalog writes. Each product-level operation runs in one transaction, so a
//! failure part way leaves the catalog as it was.

use crate::error::{is_unique_violation, GrocerError, Result};
use crate::models::product::PRODUCT_COLUMNS;
use crate::models::{
  NewVariant, NutritionFacts, Product, ProductDetail, ProductType, ProductVariant, Size, MAX_PRICE_CENTS,
};
use crate::services::{product_image_service, product_service};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub product_type_id: Option<i64>,
  pub image_url: Option<String>,
  /// Missing or empty means one unsized variant with no stock.
  pub variants: Option<Vec<NewVariant>>,
  pub nutrition: Option<NutritionFacts>,
}

/// Partial update; `None` leaves a field as it is. `description` and
/// `product_type_id` take `Some(None)` (JSON `null`) to clear them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
  pub name: Option<String>,
  #[serde(default, deserialize_with = "crate::models::nullable")]
  pub description: Option<Option<String>>,
  pub price_cents: Option<i64>,
  #[serde(default, deserialize_with = "crate::models::nullable")]
  pub product_type_id: Option<Option<i64>>,
  /// Replaces the whole variant set when present.
  pub variants: Option<Vec<NewVariant>>,
  pub nutrition: Option<NutritionFacts>,
}

const VARIANT_COLUMNS: &str = "id, product_id, size_id, stock, created_at";

fn validate_name(name: &str) -> Result<()> {
  if name.trim().is_empty() {
    return Err(GrocerError::Validation("Product name is required.".to_string()));
  }
  Ok(())
}

fn validate_price(price_cents: i64) -> Result<()> {
  if price_cents < 0 {
    return Err(GrocerError::Validation("Price cannot be negative.".to_string()));
  }
  if price_cents > MAX_PRICE_CENTS {
    return Err(GrocerError::Validation(format!(
      "Price cannot exceed {} cents.",
      MAX_PRICE_CENTS
    )));
  }
  Ok(())
}

fn validate_stock(stock: i64) -> Result<()> {
  if stock < 0 {
    return Err(GrocerError::Validation("Stock cannot be negative.".to_string()));
  }
  Ok(())
}

async fn ensure_product_type(conn: &mut SqliteConnection, type_id: i64) -> Result<()> {
  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM product_types WHERE id = ?)")
    .bind(type_id)
    .fetch_one(conn)
    .await?;
  if !exists {
    return Err(GrocerError::Validation(format!("Product type {} does not exist.", type_id)));
  }
  Ok(())
}

/// Checks every supplied variant and returns `(size_id, stock)` pairs ready
/// to insert.
async fn checked_variants(conn: &mut SqliteConnection, variants: &[NewVariant]) -> Result<Vec<(Option<i64>, i64)>> {
  let mut checked = Vec::with_capacity(variants.len());
  for variant in variants {
    let stock = variant
      .stock
      .ok_or_else(|| GrocerError::Validation("Each variant needs a stock value.".to_string()))?;
    validate_stock(stock)?;
    if let Some(size_id) = variant.size_id {
      let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sizes WHERE id = ?)")
        .bind(size_id)
        .fetch_one(&mut *conn)
        .await?;
      if !exists {
        return Err(GrocerError::Validation(format!("Size {} does not exist.", size_id)));
      }
    }
    checked.push((variant.size_id, stock));
  }
  Ok(checked)
}

/// Inserts the variants and returns whether any of them carries a size.
async fn insert_variants(conn: &mut SqliteConnection, product_id: Uuid, variants: &[(Option<i64>, i64)]) -> Result<bool> {
  let now = Utc::now();
  for &(size_id, stock) in variants {
    sqlx::query("INSERT INTO product_variants (id, product_id, size_id, stock, created_at) VALUES (?, ?, ?, ?, ?)")
      .bind(Uuid::new_v4())
      .bind(product_id)
      .bind(size_id)
      .bind(stock)
      .bind(now)
      .execute(&mut *conn)
      .await?;
  }
  Ok(variants.iter().any(|(size_id, _)| size_id.is_some()))
}

async fn recompute_has_size(conn: &mut SqliteConnection, product_id: Uuid) -> Result<bool> {
  let has_size: bool =
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM product_variants WHERE product_id = ? AND size_id IS NOT NULL)")
      .bind(product_id)
      .fetch_one(&mut *conn)
      .await?;
  sqlx::query("UPDATE products SET has_size = ?, updated_at = ? WHERE id = ?")
    .bind(has_size)
    .bind(Utc::now())
    .bind(product_id)
    .execute(&mut *conn)
    .await?;
  Ok(has_size)
}

async fn upsert_nutrition(conn: &mut SqliteConnection, product_id: Uuid, facts: &NutritionFacts) -> Result<()> {
  sqlx::query(
    "INSERT INTO product_details (product_id, calories, protein_g, fat_g, carbs_g, sugar_g, ingredients) \
     VALUES (?, ?, ?, ?, ?, ?, ?) \
     ON CONFLICT (product_id) DO UPDATE SET calories = excluded.calories, protein_g = excluded.protein_g, \
     fat_g = excluded.fat_g, carbs_g = excluded.carbs_g, sugar_g = excluded.sugar_g, ingredients = excluded.ingredients",
  )
  .bind(product_id)
  .bind(facts.calories)
  .bind(facts.protein_g)
  .bind(facts.fat_g)
  .bind(facts.carbs_g)
  .bind(facts.sugar_g)
  .bind(facts.ingredients.as_deref())
  .execute(conn)
  .await?;
  Ok(())
}

#[instrument(name = "admin_product_service::create_product", skip(pool, new_product), fields(name = %new_product.name), err(Display))]
pub async fn create_product(pool: &SqlitePool, new_product: NewProduct) -> Result<ProductDetail> {
  validate_name(&new_product.name)?;
  validate_price(new_product.price_cents)?;

  let mut tx = pool.begin().await?;
  if let Some(type_id) = new_product.product_type_id {
    ensure_product_type(&mut tx, type_id).await?;
  }

  let variants = match new_product.variants.as_deref() {
    Some(supplied) if !supplied.is_empty() => checked_variants(&mut tx, supplied).await?,
    _ => vec![(None, 0)],
  };

  let product_id = Uuid::new_v4();
  let now = Utc::now();
  sqlx::query(
    "INSERT INTO products (id, product_type_id, name, description, price_cents, has_size, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
  )
  .bind(product_id)
  .bind(new_product.product_type_id)
  .bind(new_product.name.trim())
  .bind(new_product.description.as_deref())
  .bind(new_product.price_cents)
  .bind(now)
  .bind(now)
  .execute(&mut *tx)
  .await?;

  if let Some(url) = new_product.image_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
    product_image_service::insert_image(&mut tx, product_id, url, true, 0).await?;
  }

  let has_size = insert_variants(&mut tx, product_id, &variants).await?;
  if has_size {
    sqlx::query("UPDATE products SET has_size = 1 WHERE id = ?")
      .bind(product_id)
      .execute(&mut *tx)
      .await?;
  }

  if let Some(facts) = &new_product.nutrition {
    upsert_nutrition(&mut tx, product_id, facts).await?;
  }

  tx.commit().await?;
  info!(%product_id, variants = variants.len(), has_size, "Product created.");
  product_service::get_product(pool, product_id).await
}

#[instrument(name = "admin_product_service::update_product", skip(pool, update), err(Display))]
pub async fn update_product(pool: &SqlitePool, product_id: Uuid, update: ProductUpdate) -> Result<ProductDetail> {
  if let Some(name) = &update.name {
    validate_name(name)?;
  }
  if let Some(price) = update.price_cents {
    validate_price(price)?;
  }
  if matches!(&update.variants, Some(v) if v.is_empty()) {
    return Err(GrocerError::Validation("A product needs at least one variant.".to_string()));
  }

  let mut tx = pool.begin().await?;
  let product = sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products p WHERE p.id = ?", PRODUCT_COLUMNS))
    .bind(product_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| GrocerError::NotFound(format!("Product with ID {} not found.", product_id)))?;

  if let Some(Some(type_id)) = update.product_type_id {
    ensure_product_type(&mut tx, type_id).await?;
  }

  sqlx::query(
    "UPDATE products SET name = COALESCE(?, name), \
     description = CASE WHEN ? THEN ? ELSE description END, \
     price_cents = COALESCE(?, price_cents), \
     product_type_id = CASE WHEN ? THEN ? ELSE product_type_id END, updated_at = ? \
     WHERE id = ?",
  )
  .bind(update.name.as_deref().map(str::trim))
  .bind(update.description.is_some())
  .bind(update.description.clone().flatten())
  .bind(update.price_cents)
  .bind(update.product_type_id.is_some())
  .bind(update.product_type_id.flatten())
  .bind(Utc::now())
  .bind(product.id)
  .execute(&mut *tx)
  .await?;

  if let Some(supplied) = update.variants.as_deref() {
    let variants = checked_variants(&mut tx, supplied).await?;
    sqlx::query("DELETE FROM product_variants WHERE product_id = ?")
      .bind(product.id)
      .execute(&mut *tx)
      .await?;
    insert_variants(&mut tx, product.id, &variants).await?;
    let has_size = recompute_has_size(&mut tx, product.id).await?;
    info!(variants = variants.len(), has_size, "Variants replaced.");
  }

  if let Some(facts) = &update.nutrition {
    upsert_nutrition(&mut tx, product.id, facts).await?;
  }

  tx.commit().await?;
  product_service::get_product(pool, product_id).await
}

/// Removes a product with its images, variants, details, cart rows and
/// reviews. Products that appear in an order are kept.
#[instrument(name = "admin_product_service::delete_product", skip(pool), err(Display))]
pub async fn delete_product(pool: &SqlitePool, product_id: Uuid) -> Result<()> {
  let mut tx = pool.begin().await?;

  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = ?)")
    .bind(product_id)
    .fetch_one(&mut *tx)
    .await?;
  if !exists {
    return Err(GrocerError::NotFound(format!("Product with ID {} not found.", product_id)));
  }

  let ordered: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM order_items WHERE product_id = ?)")
    .bind(product_id)
    .fetch_one(&mut *tx)
    .await?;
  if ordered {
    warn!("Refusing to delete product {} referenced by orders.", product_id);
    return Err(GrocerError::Conflict(
      "Product appears in existing orders and cannot be deleted.".to_string(),
    ));
  }

  for sql in [
    "DELETE FROM cart_items WHERE product_id = ?",
    "DELETE FROM reviews WHERE product_id = ?",
    "DELETE FROM product_images WHERE product_id = ?",
    "DELETE FROM product_variants WHERE product_id = ?",
    "DELETE FROM product_details WHERE product_id = ?",
    "DELETE FROM products WHERE id = ?",
  ] {
    sqlx::query(sql).bind(product_id).execute(&mut *tx).await?;
  }

  tx.commit().await?;
  info!("Product deleted.");
  Ok(())
}

#[instrument(name = "admin_product_service::set_variant_stock", skip(pool), err(Display))]
pub async fn set_variant_stock(pool: &SqlitePool, variant_id: Uuid, stock: i64) -> Result<ProductVariant> {
  validate_stock(stock)?;
  sqlx::query_as::<_, ProductVariant>(&format!(
    "UPDATE product_variants SET stock = ? WHERE id = ? RETURNING {}",
    VARIANT_COLUMNS
  ))
  .bind(stock)
  .bind(variant_id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| GrocerError::NotFound(format!("Variant with ID {} not found.", variant_id)))
}

/// Deletes one variant. The last variant of a product cannot be deleted.
#[instrument(name = "admin_product_service::delete_variant", skip(pool), err(Display))]
pub async fn delete_variant(pool: &SqlitePool, variant_id: Uuid) -> Result<()> {
  let mut tx = pool.begin().await?;
  let variant = sqlx::query_as::<_, ProductVariant>(&format!(
    "SELECT {} FROM product_variants WHERE id = ?",
    VARIANT_COLUMNS
  ))
  .bind(variant_id)
  .fetch_optional(&mut *tx)
  .await?
  .ok_or_else(|| GrocerError::NotFound(format!("Variant with ID {} not found.", variant_id)))?;

  let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_variants WHERE product_id = ?")
    .bind(variant.product_id)
    .fetch_one(&mut *tx)
    .await?;
  if remaining <= 1 {
    return Err(GrocerError::Conflict(
      "A product's last variant cannot be deleted.".to_string(),
    ));
  }

  sqlx::query("DELETE FROM product_variants WHERE id = ?")
    .bind(variant_id)
    .execute(&mut *tx)
    .await?;
  recompute_has_size(&mut tx, variant.product_id).await?;

  tx.commit().await?;
  info!(product_id = %variant.product_id, "Variant deleted.");
  Ok(())
}

fn lookup_name(name: &str, what: &str) -> Result<String> {
  let name = name.trim();
  if name.is_empty() {
    return Err(GrocerError::Validation(format!("{} name is required.", what)));
  }
  Ok(name.to_string())
}

#[instrument(name = "admin_product_service::create_product_type", skip(pool), err(Display))]
pub async fn create_product_type(pool: &SqlitePool, name: &str) -> Result<ProductType> {
  let name = lookup_name(name, "Product type")?;
  let inserted = sqlx::query_as::<_, ProductType>("INSERT INTO product_types (name) VALUES (?) RETURNING id, name")
    .bind(&name)
    .fetch_one(pool)
    .await;
  match inserted {
    Ok(product_type) => Ok(product_type),
    Err(e) if is_unique_violation(&e) => Err(GrocerError::Conflict(format!("Product type '{}' already exists.", name))),
    Err(e) => Err(e.into()),
  }
}

#[instrument(name = "admin_product_service::create_size", skip(pool), err(Display))]
pub async fn create_size(pool: &SqlitePool, name: &str) -> Result<Size> {
  let name = lookup_name(name, "Size")?;
  let inserted = sqlx::query_as::<_, Size>("INSERT INTO sizes (name) VALUES (?) RETURNING id, name")
    .bind(&name)
    .fetch_one(pool)
    .await;
  match inserted {
    Ok(size) => Ok(size),
    Err(e) if is_unique_violation(&e) => Err(GrocerError::Conflict(format!("Size '{}' already exists.", name))),
    Err(e) => Err(e.into()),
  }
}
