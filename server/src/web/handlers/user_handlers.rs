// grocer_server/src/web/handlers/user_handlers.rs

use actix_web::{web, HttpResponse};
use grocer::services::user_service::{self, ProfileUpdate};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::response;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
  pub current_password: String,
  pub new_password: String,
}

#[instrument(name = "handler::get_me", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_me_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let user = user_service::get_user(&app_state.db_pool, auth_user.user_id).await?;
  Ok(response::ok("Profile fetched successfully.", user))
}

#[instrument(name = "handler::update_me", skip(app_state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_me_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
  let user = user_service::update_profile(&app_state.db_pool, auth_user.user_id, payload.into_inner()).await?;
  Ok(response::ok("Profile updated successfully.", user))
}

#[instrument(name = "handler::change_password", skip(app_state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn change_password_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
  user_service::change_password(
    &app_state.db_pool,
    auth_user.user_id,
    &payload.current_password,
    &payload.new_password,
  )
  .await?;
  Ok(response::message("Password changed successfully."))
}
