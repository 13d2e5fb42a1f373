// grocer/src/services/product_image_service.rs

//! Product images. At most one image per product is primary, and a product
//! with images always has one.

use crate::error::{GrocerError, Result};
use crate::models::product_image::IMAGE_COLUMNS;
use crate::models::ProductImage;
use crate::services::product_service;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, instrument};
use uuid::Uuid;

pub(crate) async fn insert_image(
  conn: &mut SqliteConnection,
  product_id: Uuid,
  url: &str,
  is_primary: bool,
  sort_order: i64,
) -> Result<ProductImage> {
  let image = sqlx::query_as::<_, ProductImage>(&format!(
    "INSERT INTO product_images (id, product_id, url, is_primary, sort_order, created_at) \
     VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
    IMAGE_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(product_id)
  .bind(url)
  .bind(is_primary)
  .bind(sort_order)
  .bind(Utc::now())
  .fetch_one(conn)
  .await?;
  Ok(image)
}

fn validate_url(url: &str) -> Result<&str> {
  let url = url.trim();
  if url.is_empty() {
    return Err(GrocerError::Validation("Image URL is required.".to_string()));
  }
  Ok(url)
}

async fn find_image(conn: &mut SqliteConnection, image_id: Uuid) -> Result<ProductImage> {
  sqlx::query_as::<_, ProductImage>(&format!("SELECT {} FROM product_images WHERE id = ?", IMAGE_COLUMNS))
    .bind(image_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| GrocerError::NotFound(format!("Image with ID {} not found.", image_id)))
}

/// Appends an image. The first image of a product becomes primary whatever
/// `is_primary` says; a new primary demotes the previous one.
#[instrument(name = "product_image_service::add_image", skip(pool), err(Display))]
pub async fn add_image(pool: &SqlitePool, product_id: Uuid, url: &str, is_primary: bool) -> Result<ProductImage> {
  let url = validate_url(url)?;
  let mut tx = pool.begin().await?;

  let product_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = ?)")
    .bind(product_id)
    .fetch_one(&mut *tx)
    .await?;
  if !product_exists {
    return Err(GrocerError::NotFound(format!("Product with ID {} not found.", product_id)));
  }

  let (existing, next_order): (i64, i64) =
    sqlx::query_as("SELECT COUNT(*), COALESCE(MAX(sort_order) + 1, 0) FROM product_images WHERE product_id = ?")
      .bind(product_id)
      .fetch_one(&mut *tx)
      .await?;
  let primary = is_primary || existing == 0;
  if primary {
    sqlx::query("UPDATE product_images SET is_primary = 0 WHERE product_id = ?")
      .bind(product_id)
      .execute(&mut *tx)
      .await?;
  }

  let image = insert_image(&mut tx, product_id, url, primary, next_order).await?;
  tx.commit().await?;
  info!(image_id = %image.id, primary, "Product image added.");
  Ok(image)
}

pub async fn list_images(pool: &SqlitePool, product_id: Uuid) -> Result<Vec<ProductImage>> {
  product_service::list_images(pool, product_id).await
}

#[instrument(name = "product_image_service::set_primary", skip(pool), err(Display))]
pub async fn set_primary(pool: &SqlitePool, image_id: Uuid) -> Result<ProductImage> {
  let mut tx = pool.begin().await?;
  let image = find_image(&mut tx, image_id).await?;

  sqlx::query("UPDATE product_images SET is_primary = (id = ?) WHERE product_id = ?")
    .bind(image_id)
    .bind(image.product_id)
    .execute(&mut *tx)
    .await?;
  let image = find_image(&mut tx, image_id).await?;
  tx.commit().await?;
  Ok(image)
}

/// Deletes an image. When it was the primary one, the next image in sort
/// order takes over. Returns `false` when no such image exists.
#[instrument(name = "product_image_service::delete_image", skip(pool), err(Display))]
pub async fn delete_image(pool: &SqlitePool, image_id: Uuid) -> Result<bool> {
  let mut tx = pool.begin().await?;
  let image = match find_image(&mut tx, image_id).await {
    Ok(image) => image,
    Err(GrocerError::NotFound(_)) => return Ok(false),
    Err(e) => return Err(e),
  };

  sqlx::query("DELETE FROM product_images WHERE id = ?")
    .bind(image_id)
    .execute(&mut *tx)
    .await?;

  if image.is_primary {
    sqlx::query(
      "UPDATE product_images SET is_primary = 1 WHERE id = \
       (SELECT id FROM product_images WHERE product_id = ? ORDER BY sort_order ASC, created_at ASC LIMIT 1)",
    )
    .bind(image.product_id)
    .execute(&mut *tx)
    .await?;
  }

  tx.commit().await?;
  info!(product_id = %image.product_id, "Product image deleted.");
  Ok(true)
}
