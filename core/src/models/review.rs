// grocer/src/models/review.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
  pub id: Uuid,
  pub product_id: Uuid,
  pub user_id: Uuid,
  pub rating: i64,
  pub comment: Option<String>,
  /// Fixed when the review is created; later orders do not change it.
  pub is_verified_purchase: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub(crate) const REVIEW_COLUMNS: &str =
  "id, product_id, user_id, rating, comment, is_verified_purchase, created_at, updated_at";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub review: Review,
  pub reviewer_name: String,
}

/// Average rating and 1..=5 histogram for a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
  /// Rounded to one decimal; `0.0` when there are no reviews.
  pub average: f64,
  pub count: i64,
  /// Always holds keys 1 through 5.
  pub histogram: BTreeMap<u8, i64>,
}

impl RatingSummary {
  pub fn empty() -> Self {
    Self::new(None, 0, &[])
  }

  /// Builds the summary from `AVG(rating)`, `COUNT(*)` and the
  /// `(rating, count)` rows of a `GROUP BY rating`.
  pub fn new(average: Option<f64>, count: i64, buckets: &[(i64, i64)]) -> Self {
    let mut histogram: BTreeMap<u8, i64> = (1..=5).map(|stars| (stars, 0)).collect();
    for &(rating, n) in buckets {
      if let Ok(stars) = u8::try_from(rating) {
        if let Some(slot) = histogram.get_mut(&stars) {
          *slot += n;
        }
      }
    }
    let average = average.map(|avg| (avg * 10.0).round() / 10.0).unwrap_or(0.0);
    Self {
      average,
      count,
      histogram,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReviews {
  pub summary: RatingSummary,
  pub reviews: Vec<ReviewView>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn summary_rounds_average_and_fills_missing_buckets() {
    let summary = RatingSummary::new(Some(4.333333), 3, &[(5, 2), (3, 1)]);
    assert_eq!(summary.average, 4.3);
    assert_eq!(summary.count, 3);
    assert_eq!(summary.histogram.get(&5), Some(&2));
    assert_eq!(summary.histogram.get(&3), Some(&1));
    assert_eq!(summary.histogram.get(&1), Some(&0));
    assert_eq!(summary.histogram.len(), 5);
  }

  #[test]
  fn empty_summary_has_zero_average() {
    let summary = RatingSummary::empty();
    assert_eq!(summary.average, 0.0);
    assert_eq!(summary.count, 0);
    assert!(summary.histogram.values().all(|&n| n == 0));
  }
}
