// grocer/src/services/product_service.rs

//! Catalog reads: listing, product page, lookups.

use crate::error::{GrocerError, Result};
use crate::models::product::PRODUCT_COLUMNS;
use crate::models::product_image::IMAGE_COLUMNS;
use crate::models::{
  NutritionFacts, Page, PageRequest, Product, ProductDetail, ProductImage, ProductSummary, ProductType, Size,
  VariantView,
};
use crate::services::review_service;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
  #[default]
  Newest,
  PriceAsc,
  PriceDesc,
  Name,
}

impl ProductSort {
  fn order_by(self) -> &'static str {
    match self {
      ProductSort::Newest => " ORDER BY p.created_at DESC, p.name ASC",
      ProductSort::PriceAsc => " ORDER BY p.price_cents ASC, p.name ASC",
      ProductSort::PriceDesc => " ORDER BY p.price_cents DESC, p.name ASC",
      ProductSort::Name => " ORDER BY p.name ASC",
    }
  }
}

/// Catalog filters as they arrive from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
  pub product_type_id: Option<i64>,
  pub search: Option<String>,
  pub min_price_cents: Option<i64>,
  pub max_price_cents: Option<i64>,
  pub sort: Option<ProductSort>,
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

impl ProductQuery {
  pub fn page_request(&self) -> PageRequest {
    PageRequest {
      page: self.page,
      limit: self.limit,
    }
  }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &ProductQuery) {
  qb.push(" WHERE 1 = 1");
  if let Some(type_id) = query.product_type_id {
    qb.push(" AND p.product_type_id = ").push_bind(type_id);
  }
  if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
    let pattern = format!("%{}%", search.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_"));
    qb.push(" AND p.name LIKE ").push_bind(pattern).push(" ESCAPE '\\'");
  }
  if let Some(min) = query.min_price_cents {
    qb.push(" AND p.price_cents >= ").push_bind(min);
  }
  if let Some(max) = query.max_price_cents {
    qb.push(" AND p.price_cents <= ").push_bind(max);
  }
}

pub(crate) const PRIMARY_IMAGE_SUBQUERY: &str = "(SELECT url FROM product_images pi WHERE pi.product_id = p.id \
   ORDER BY pi.is_primary DESC, pi.sort_order ASC LIMIT 1)";

#[instrument(name = "product_service::list_products", skip(pool), err(Display))]
pub async fn list_products(pool: &SqlitePool, query: &ProductQuery) -> Result<Page<ProductSummary>> {
  if let (Some(min), Some(max)) = (query.min_price_cents, query.max_price_cents) {
    if min > max {
      return Err(GrocerError::Validation(
        "minPriceCents cannot be greater than maxPriceCents.".to_string(),
      ));
    }
  }
  let page = query.page_request();
  let (_, limit) = page.normalized();

  let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products p");
  push_filters(&mut count_qb, query);
  let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

  let mut qb = QueryBuilder::<Sqlite>::new(format!(
    "SELECT {}, pt.name AS type_name, {} AS primary_image, \
     COALESCE((SELECT SUM(v.stock) FROM product_variants v WHERE v.product_id = p.id), 0) AS total_stock, \
     (SELECT AVG(r.rating) FROM reviews r WHERE r.product_id = p.id) AS average_rating, \
     (SELECT COUNT(*) FROM reviews r WHERE r.product_id = p.id) AS review_count \
     FROM products p LEFT JOIN product_types pt ON pt.id = p.product_type_id",
    PRODUCT_COLUMNS, PRIMARY_IMAGE_SUBQUERY
  ));
  push_filters(&mut qb, query);
  qb.push(query.sort.unwrap_or_default().order_by());
  qb.push(" LIMIT ").push_bind(limit);
  qb.push(" OFFSET ").push_bind(page.offset());

  let mut items: Vec<ProductSummary> = qb.build_query_as().fetch_all(pool).await?;
  for item in &mut items {
    item.average_rating = item.average_rating.map(|avg| (avg * 10.0).round() / 10.0);
  }
  debug!(returned = items.len(), total, "Catalog page fetched.");
  Ok(Page::new(items, &page, total))
}

pub async fn find_product(pool: &SqlitePool, product_id: Uuid) -> Result<Product> {
  sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products p WHERE p.id = ?", PRODUCT_COLUMNS))
    .bind(product_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| GrocerError::NotFound(format!("Product with ID {} not found.", product_id)))
}

pub async fn list_images(pool: &SqlitePool, product_id: Uuid) -> Result<Vec<ProductImage>> {
  let images = sqlx::query_as::<_, ProductImage>(&format!(
    "SELECT {} FROM product_images WHERE product_id = ? ORDER BY is_primary DESC, sort_order ASC, created_at ASC",
    IMAGE_COLUMNS
  ))
  .bind(product_id)
  .fetch_all(pool)
  .await?;
  Ok(images)
}

pub async fn list_variants(pool: &SqlitePool, product_id: Uuid) -> Result<Vec<VariantView>> {
  let variants = sqlx::query_as::<_, VariantView>(
    "SELECT v.id, v.size_id, s.name AS size_name, v.stock FROM product_variants v \
     LEFT JOIN sizes s ON s.id = v.size_id WHERE v.product_id = ? \
     ORDER BY v.size_id IS NULL, v.size_id ASC, v.created_at ASC",
  )
  .bind(product_id)
  .fetch_all(pool)
  .await?;
  Ok(variants)
}

/// Product page: product, type, images, variants, nutrition and ratings.
#[instrument(name = "product_service::get_product", skip(pool), err(Display))]
pub async fn get_product(pool: &SqlitePool, product_id: Uuid) -> Result<ProductDetail> {
  let product = find_product(pool, product_id).await?;

  let product_type = match product.product_type_id {
    Some(type_id) => {
      sqlx::query_as::<_, ProductType>("SELECT id, name FROM product_types WHERE id = ?")
        .bind(type_id)
        .fetch_optional(pool)
        .await?
    }
    None => None,
  };

  let images = list_images(pool, product_id).await?;
  let variants = list_variants(pool, product_id).await?;
  let nutrition = sqlx::query_as::<_, NutritionFacts>(
    "SELECT calories, protein_g, fat_g, carbs_g, sugar_g, ingredients FROM product_details WHERE product_id = ?",
  )
  .bind(product_id)
  .fetch_optional(pool)
  .await?;
  let rating = review_service::rating_summary(pool, product_id).await?;

  Ok(ProductDetail {
    product,
    product_type,
    images,
    variants,
    nutrition,
    rating,
  })
}

pub async fn list_product_types(pool: &SqlitePool) -> Result<Vec<ProductType>> {
  let types = sqlx::query_as::<_, ProductType>("SELECT id, name FROM product_types ORDER BY name ASC")
    .fetch_all(pool)
    .await?;
  Ok(types)
}

pub async fn list_sizes(pool: &SqlitePool) -> Result<Vec<Size>> {
  let sizes = sqlx::query_as::<_, Size>("SELECT id, name FROM sizes ORDER BY id ASC")
    .fetch_all(pool)
    .await?;
  Ok(sizes)
}
