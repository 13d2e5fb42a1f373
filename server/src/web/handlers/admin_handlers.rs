// grocer_server/src/web/handlers/admin_handlers.rs

//! Back-office endpoints. Every handler takes `AdminUser`, so a customer
//! token is turned away before any of them run.

use actix_web::{web, HttpResponse};
use grocer::models::{OrderStatus, PageRequest, Role};
use grocer::services::admin_product_service::{self, NewProduct, ProductUpdate};
use grocer::services::{order_service, product_image_service, user_service};
use grocer::GrocerError;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AdminUser;
use crate::web::response;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddImagePayload {
  pub url: String,
  #[serde(default)]
  pub is_primary: bool,
}

#[derive(Deserialize, Debug)]
pub struct StockPayload {
  pub stock: i64,
}

#[derive(Deserialize, Debug)]
pub struct NamePayload {
  pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct OrderListQuery {
  pub status: Option<OrderStatus>,
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct StatusPayload {
  pub status: OrderStatus,
}

#[derive(Deserialize, Debug)]
pub struct RolePayload {
  pub role: Role,
}

// --- Products ---

#[instrument(name = "handler::admin_create_product", skip(app_state, _admin, payload), fields(name = %payload.name))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  payload: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
  let product = admin_product_service::create_product(&app_state.db_pool, payload.into_inner()).await?;
  info!(product_id = %product.product.id, "Product created via admin API.");
  Ok(response::created("Product created successfully.", product))
}

#[instrument(name = "handler::admin_update_product", skip(app_state, _admin, path, payload), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<ProductUpdate>,
) -> Result<HttpResponse, AppError> {
  let product = admin_product_service::update_product(&app_state.db_pool, path.into_inner(), payload.into_inner()).await?;
  Ok(response::ok("Product updated successfully.", product))
}

#[instrument(name = "handler::admin_delete_product", skip(app_state, _admin, path), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  admin_product_service::delete_product(&app_state.db_pool, path.into_inner()).await?;
  Ok(response::message("Product deleted successfully."))
}

// --- Images ---

#[instrument(name = "handler::admin_add_image", skip(app_state, _admin, path, payload), fields(product_id = %path.as_ref()))]
pub async fn add_image_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<AddImagePayload>,
) -> Result<HttpResponse, AppError> {
  let image =
    product_image_service::add_image(&app_state.db_pool, path.into_inner(), &payload.url, payload.is_primary).await?;
  Ok(response::created("Image added successfully.", image))
}

#[instrument(name = "handler::admin_delete_image", skip(app_state, _admin, path), fields(image_id = %path.as_ref()))]
pub async fn delete_image_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !product_image_service::delete_image(&app_state.db_pool, path.into_inner()).await? {
    return Err(GrocerError::NotFound("Image not found.".to_string()).into());
  }
  Ok(response::message("Image deleted successfully."))
}

#[instrument(name = "handler::admin_set_primary_image", skip(app_state, _admin, path), fields(image_id = %path.as_ref()))]
pub async fn set_primary_image_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let image = product_image_service::set_primary(&app_state.db_pool, path.into_inner()).await?;
  Ok(response::ok("Primary image updated.", image))
}

// --- Variants ---

#[instrument(name = "handler::admin_set_variant_stock", skip(app_state, _admin, path, payload), fields(variant_id = %path.as_ref()))]
pub async fn set_variant_stock_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<StockPayload>,
) -> Result<HttpResponse, AppError> {
  let variant = admin_product_service::set_variant_stock(&app_state.db_pool, path.into_inner(), payload.stock).await?;
  Ok(response::ok("Stock updated.", variant))
}

#[instrument(name = "handler::admin_delete_variant", skip(app_state, _admin, path), fields(variant_id = %path.as_ref()))]
pub async fn delete_variant_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  admin_product_service::delete_variant(&app_state.db_pool, path.into_inner()).await?;
  Ok(response::message("Variant deleted successfully."))
}

// --- Lookups ---

pub async fn create_product_type_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  payload: web::Json<NamePayload>,
) -> Result<HttpResponse, AppError> {
  let product_type = admin_product_service::create_product_type(&app_state.db_pool, &payload.name).await?;
  Ok(response::created("Product type created.", product_type))
}

pub async fn create_size_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  payload: web::Json<NamePayload>,
) -> Result<HttpResponse, AppError> {
  let size = admin_product_service::create_size(&app_state.db_pool, &payload.name).await?;
  Ok(response::created("Size created.", size))
}

// --- Orders ---

#[instrument(name = "handler::admin_list_orders", skip(app_state, _admin))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  query: web::Query<OrderListQuery>,
) -> Result<HttpResponse, AppError> {
  let page = PageRequest {
    page: query.page,
    limit: query.limit,
  };
  let orders = order_service::list_all_orders(&app_state.db_pool, query.status, &page).await?;
  Ok(response::ok("Orders fetched successfully.", orders))
}

#[instrument(name = "handler::admin_update_order_status", skip(app_state, _admin, path, payload), fields(order_id = %path.as_ref(), status = %payload.status))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<StatusPayload>,
) -> Result<HttpResponse, AppError> {
  let order = order_service::update_status(&app_state.db_pool, path.into_inner(), payload.status).await?;
  Ok(response::ok("Order status updated.", order))
}

// --- Users ---

#[instrument(name = "handler::admin_list_users", skip(app_state, _admin))]
pub async fn list_users_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  query: web::Query<PageRequest>,
) -> Result<HttpResponse, AppError> {
  let users = user_service::list_users(&app_state.db_pool, &query).await?;
  Ok(response::ok("Users fetched successfully.", users))
}

#[instrument(name = "handler::admin_set_role", skip(app_state, _admin, path, payload), fields(user_id = %path.as_ref(), role = %payload.role))]
pub async fn set_role_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<RolePayload>,
) -> Result<HttpResponse, AppError> {
  let user = user_service::set_role(&app_state.db_pool, path.into_inner(), payload.role).await?;
  Ok(response::ok("Role updated.", user))
}

#[instrument(name = "handler::admin_delete_user", skip(app_state, admin, path), fields(user_id = %path.as_ref()))]
pub async fn delete_user_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  if user_id == admin.0.user_id {
    return Err(AppError::bad_request("Administrators cannot delete their own account."));
  }
  user_service::delete_user(&app_state.db_pool, user_id).await?;
  Ok(response::message("User deleted successfully."))
}
