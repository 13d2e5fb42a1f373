// grocer_server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use grocer::services::product_service::{self, ProductQuery};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::response;

#[instrument(name = "handler::list_products", skip(app_state, query_params))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ProductQuery>,
) -> Result<HttpResponse, AppError> {
  let page = product_service::list_products(&app_state.db_pool, &query_params).await?;
  info!("Successfully fetched {} of {} products.", page.items.len(), page.total);
  Ok(response::ok("Products fetched successfully.", page))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = product_service::get_product(&app_state.db_pool, path.into_inner()).await?;
  Ok(response::ok("Product fetched successfully.", product))
}

pub async fn list_product_types_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let types = product_service::list_product_types(&app_state.db_pool).await?;
  Ok(response::ok("Product types fetched successfully.", types))
}

pub async fn list_sizes_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let sizes = product_service::list_sizes(&app_state.db_pool).await?;
  Ok(response::ok("Sizes fetched successfully.", sizes))
}
