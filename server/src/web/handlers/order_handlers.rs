// grocer_server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use grocer::models::ShippingAddress;
use grocer::services::order_service;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::response;

#[instrument(name = "handler::place_order", skip(app_state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<ShippingAddress>,
) -> Result<HttpResponse, AppError> {
  let order = order_service::place_order(
    &app_state.db_pool,
    &app_state.config,
    auth_user.user_id,
    payload.into_inner(),
  )
  .await?;
  info!(order_id = %order.order.id, "Checkout completed.");
  Ok(response::created("Order placed successfully.", order))
}

#[instrument(name = "handler::list_my_orders", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = order_service::list_orders_for_user(&app_state.db_pool, auth_user.user_id).await?;
  Ok(response::ok("Orders fetched successfully.", orders))
}

#[instrument(name = "handler::get_my_order", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = order_service::get_order_for_user(&app_state.db_pool, auth_user.user_id, path.into_inner()).await?;
  Ok(response::ok("Order fetched successfully.", order))
}

#[instrument(name = "handler::cancel_order", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = order_service::cancel_order(&app_state.db_pool, auth_user.user_id, path.into_inner()).await?;
  Ok(response::ok("Order cancelled.", order))
}
