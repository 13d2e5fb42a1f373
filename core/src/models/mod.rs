// grocer/src/models/mod.rs

//! Contains data structures representing database entities and the views
//! the services assemble from them.

pub mod cart;
pub mod order;
pub mod product;
pub mod product_image;
pub mod product_variant;
pub mod review;
pub mod user;

pub use cart::{Cart, CartItem, CartLine, CartView, MAX_ITEM_QUANTITY};
pub use order::{Order, OrderDetail, OrderItem, OrderStatus, OrderTotals, ShippingAddress};
pub use product::{NutritionFacts, Product, ProductDetail, ProductSummary, ProductType, MAX_PRICE_CENTS};
pub use product_image::ProductImage;
pub use product_variant::{NewVariant, ProductVariant, Size, VariantView};
pub use review::{ProductReviews, RatingSummary, Review, ReviewView};
pub use user::{Role, User};

use serde::{Deserialize, Deserializer, Serialize};

/// Field helper for partial updates: an absent field stays `None` (keep the
/// stored value) while an explicit `null` becomes `Some(None)` (clear it).
/// Pair with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Page selection as it arrives from a query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

impl PageRequest {
  /// `(page, limit)` clamped to `page >= 1` and `1 <= limit <= MAX_PAGE_LIMIT`.
  pub fn normalized(&self) -> (i64, i64) {
    let page = self.page.unwrap_or(1).max(1);
    let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    (page, limit)
  }

  pub fn offset(&self) -> i64 {
    let (page, limit) = self.normalized();
    (page - 1) * limit
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items: Vec<T>,
  pub page: i64,
  pub limit: i64,
  pub total: i64,
  pub total_pages: i64,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, request: &PageRequest, total: i64) -> Self {
    let (page, limit) = request.normalized();
    let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
    Self {
      items,
      page,
      limit,
      total,
      total_pages,
    }
  }
}
