// grocer_server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use grocer::services::cart_service;
use grocer::GrocerError;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::response;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequestPayload {
  pub product_id: Uuid,
  pub quantity: i64,
}

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityPayload {
  pub quantity: i64,
}

#[instrument(name = "handler::get_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let cart = cart_service::get_cart(&app_state.db_pool, auth_user.user_id).await?;
  Ok(response::ok("Cart fetched successfully.", cart))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id, quantity = %req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AddToCartRequestPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let item = cart_service::add_item(
    &app_state.db_pool,
    auth_user.user_id,
    req_payload.product_id,
    req_payload.quantity,
  )
  .await?;
  info!(cart_item_id = %item.id, new_quantity = item.quantity, "Add to cart successful.");
  Ok(response::ok("Item added to cart successfully.", item))
}

#[instrument(name = "handler::update_cart_item", skip(app_state, auth_user, path, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateQuantityPayload>,
) -> Result<HttpResponse, AppError> {
  let item = cart_service::update_item(&app_state.db_pool, auth_user.user_id, path.into_inner(), payload.quantity).await?;
  Ok(response::ok("Cart item updated successfully.", item))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  if !cart_service::remove_item(&app_state.db_pool, auth_user.user_id, product_id).await? {
    return Err(GrocerError::NotFound("Item not found in cart.".to_string()).into());
  }
  Ok(response::message("Item removed from cart."))
}

#[instrument(name = "handler::clear_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn clear_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let removed = cart_service::clear_cart(&app_state.db_pool, auth_user.user_id).await?;
  Ok(response::ok("Cart cleared.", serde_json::json!({ "removed": removed })))
}
