// grocer_server/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use grocer::services::user_service::{self, NewUser};
use grocer::services::password_reset;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::response;

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct ResetRequest {
  pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct VerifyCodeRequest {
  pub email: String,
  pub code: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResetRequest {
  pub email: String,
  pub code: String,
  pub new_password: String,
}

#[instrument(name = "handler::register", skip(app_state, payload), fields(email = %payload.email))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewUser>,
) -> Result<HttpResponse, AppError> {
  let user = user_service::register(
    &app_state.db_pool,
    app_state.mailer.as_ref(),
    &app_state.config,
    payload.into_inner(),
  )
  .await?;
  info!(user_id = %user.id, "Registration handled.");
  Ok(response::created("Account created successfully.", user))
}

#[instrument(name = "handler::login", skip(app_state, payload), fields(email = %payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
  let result = user_service::login(&app_state.db_pool, &app_state.config, &payload.email, &payload.password).await?;
  Ok(response::ok("Signed in successfully.", result))
}

#[instrument(name = "handler::request_password_reset", skip(app_state, payload))]
pub async fn request_reset_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<ResetRequest>,
) -> Result<HttpResponse, AppError> {
  password_reset::request_reset(
    &app_state.db_pool,
    app_state.mailer.as_ref(),
    &app_state.config,
    &payload.email,
  )
  .await?;
  Ok(response::message("A reset code has been sent to your email."))
}

#[instrument(name = "handler::verify_reset_code", skip(app_state, payload))]
pub async fn verify_code_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<VerifyCodeRequest>,
) -> Result<HttpResponse, AppError> {
  password_reset::verify_code(&app_state.db_pool, &app_state.config.auth, &payload.email, &payload.code).await?;
  Ok(response::message("Reset code is valid."))
}

#[instrument(name = "handler::confirm_password_reset", skip(app_state, payload))]
pub async fn confirm_reset_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<ConfirmResetRequest>,
) -> Result<HttpResponse, AppError> {
  password_reset::reset_password(
    &app_state.db_pool,
    &app_state.config.auth,
    &payload.email,
    &payload.code,
    &payload.new_password,
  )
  .await?;
  Ok(response::message("Password has been reset."))
}
