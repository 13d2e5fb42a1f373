// grocer/src/services/review_service.rs

//! Product reviews, one per user and product.

use crate::error::{is_unique_violation, GrocerError, Result};
use crate::models::review::REVIEW_COLUMNS;
use crate::models::{OrderStatus, ProductReviews, RatingSummary, Review, ReviewView, Role};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
  pub rating: i64,
  pub comment: Option<String>,
}

fn validate_rating(rating: i64) -> Result<()> {
  if !(1..=5).contains(&rating) {
    return Err(GrocerError::Validation("Rating must be between 1 and 5.".to_string()));
  }
  Ok(())
}

fn duplicate() -> GrocerError {
  GrocerError::Conflict("You have already reviewed this product.".to_string())
}

/// Average, count and histogram, computed from the rows on every call.
pub async fn rating_summary(pool: &SqlitePool, product_id: Uuid) -> Result<RatingSummary> {
  let (average, count): (Option<f64>, i64) =
    sqlx::query_as("SELECT AVG(rating), COUNT(*) FROM reviews WHERE product_id = ?")
      .bind(product_id)
      .fetch_one(pool)
      .await?;
  let buckets: Vec<(i64, i64)> =
    sqlx::query_as("SELECT rating, COUNT(*) FROM reviews WHERE product_id = ? GROUP BY rating")
      .bind(product_id)
      .fetch_all(pool)
      .await?;
  Ok(RatingSummary::new(average, count, &buckets))
}

/// Creates the user's review of a product. The verified-purchase flag is
/// decided here, from the user's delivered orders.
#[instrument(name = "review_service::create_review", skip(pool, input), fields(rating = input.rating), err(Display))]
pub async fn create_review(pool: &SqlitePool, user_id: Uuid, product_id: Uuid, input: ReviewInput) -> Result<Review> {
  validate_rating(input.rating)?;

  let product_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = ?)")
    .bind(product_id)
    .fetch_one(pool)
    .await?;
  if !product_exists {
    return Err(GrocerError::NotFound(format!("Product with ID {} not found.", product_id)));
  }

  let already: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reviews WHERE product_id = ? AND user_id = ?)")
    .bind(product_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
  if already {
    warn!("Duplicate review attempt.");
    return Err(duplicate());
  }

  let verified: bool = sqlx::query_scalar(
    "SELECT EXISTS(SELECT 1 FROM order_items oi JOIN orders o ON o.id = oi.order_id \
     WHERE o.user_id = ? AND oi.product_id = ? AND o.status = ?)",
  )
  .bind(user_id)
  .bind(product_id)
  .bind(OrderStatus::Delivered.as_str())
  .fetch_one(pool)
  .await?;

  let now = Utc::now();
  let inserted = sqlx::query_as::<_, Review>(&format!(
    "INSERT INTO reviews (id, product_id, user_id, rating, comment, is_verified_purchase, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
    REVIEW_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(product_id)
  .bind(user_id)
  .bind(input.rating)
  .bind(input.comment.as_deref().map(str::trim))
  .bind(verified)
  .bind(now)
  .bind(now)
  .fetch_one(pool)
  .await;

  match inserted {
    Ok(review) => {
      info!(review_id = %review.id, verified, "Review created.");
      Ok(review)
    }
    Err(e) if is_unique_violation(&e) => Err(duplicate()),
    Err(e) => Err(e.into()),
  }
}

#[instrument(name = "review_service::list_reviews", skip(pool), err(Display))]
pub async fn list_reviews(pool: &SqlitePool, product_id: Uuid) -> Result<ProductReviews> {
  let product_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = ?)")
    .bind(product_id)
    .fetch_one(pool)
    .await?;
  if !product_exists {
    return Err(GrocerError::NotFound(format!("Product with ID {} not found.", product_id)));
  }

  let reviews = sqlx::query_as::<_, ReviewView>(
    "SELECT r.id, r.product_id, r.user_id, r.rating, r.comment, r.is_verified_purchase, r.created_at, r.updated_at, \
     u.full_name AS reviewer_name FROM reviews r JOIN users u ON u.id = r.user_id \
     WHERE r.product_id = ? ORDER BY r.created_at DESC",
  )
  .bind(product_id)
  .fetch_all(pool)
  .await?;
  let summary = rating_summary(pool, product_id).await?;
  Ok(ProductReviews { summary, reviews })
}

async fn find_review(pool: &SqlitePool, review_id: Uuid) -> Result<Review> {
  sqlx::query_as::<_, Review>(&format!("SELECT {} FROM reviews WHERE id = ?", REVIEW_COLUMNS))
    .bind(review_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| GrocerError::NotFound(format!("Review with ID {} not found.", review_id)))
}

/// Only the author can edit a review.
#[instrument(name = "review_service::update_review", skip(pool, input), err(Display))]
pub async fn update_review(pool: &SqlitePool, user_id: Uuid, review_id: Uuid, input: ReviewInput) -> Result<Review> {
  validate_rating(input.rating)?;
  let review = find_review(pool, review_id).await?;
  if review.user_id != user_id {
    return Err(GrocerError::Forbidden("You can only edit your own reviews.".to_string()));
  }

  let updated = sqlx::query_as::<_, Review>(&format!(
    "UPDATE reviews SET rating = ?, comment = ?, updated_at = ? WHERE id = ? RETURNING {}",
    REVIEW_COLUMNS
  ))
  .bind(input.rating)
  .bind(input.comment.as_deref().map(str::trim))
  .bind(Utc::now())
  .bind(review_id)
  .fetch_one(pool)
  .await?;
  Ok(updated)
}

/// The author or an admin can delete a review.
#[instrument(name = "review_service::delete_review", skip(pool), err(Display))]
pub async fn delete_review(pool: &SqlitePool, user_id: Uuid, role: Role, review_id: Uuid) -> Result<()> {
  let review = find_review(pool, review_id).await?;
  if review.user_id != user_id && role != Role::Admin {
    return Err(GrocerError::Forbidden("You can only delete your own reviews.".to_string()));
  }

  sqlx::query("DELETE FROM reviews WHERE id = ?")
    .bind(review_id)
    .execute(pool)
    .await?;
  info!(product_id = %review.product_id, "Review deleted.");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ratings_outside_one_to_five_are_rejected() {
    assert!(validate_rating(0).is_err());
    assert!(validate_rating(6).is_err());
    assert!((1..=5).all(|r| validate_rating(r).is_ok()));
  }
}
