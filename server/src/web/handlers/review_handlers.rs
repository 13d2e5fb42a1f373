// grocer_server/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use grocer::services::review_service::{self, ReviewInput};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::response;

#[instrument(name = "handler::list_reviews", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn list_reviews_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let reviews = review_service::list_reviews(&app_state.db_pool, path.into_inner()).await?;
  Ok(response::ok("Reviews fetched successfully.", reviews))
}

#[instrument(
  name = "handler::create_review",
  skip(app_state, auth_user, path, payload),
  fields(user_id = %auth_user.user_id, product_id = %path.as_ref())
)]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ReviewInput>,
) -> Result<HttpResponse, AppError> {
  let review = review_service::create_review(
    &app_state.db_pool,
    auth_user.user_id,
    path.into_inner(),
    payload.into_inner(),
  )
  .await?;
  Ok(response::created("Review submitted successfully.", review))
}

#[instrument(name = "handler::update_review", skip(app_state, auth_user, path, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_review_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ReviewInput>,
) -> Result<HttpResponse, AppError> {
  let review = review_service::update_review(
    &app_state.db_pool,
    auth_user.user_id,
    path.into_inner(),
    payload.into_inner(),
  )
  .await?;
  Ok(response::ok("Review updated successfully.", review))
}

#[instrument(name = "handler::delete_review", skip(app_state, auth_user, path), fields(user_id = %auth_user.user_id))]
pub async fn delete_review_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  review_service::delete_review(&app_state.db_pool, auth_user.user_id, auth_user.role, path.into_inner()).await?;
  Ok(response::message("Review deleted successfully."))
}
