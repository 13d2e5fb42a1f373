// grocer_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use grocer::{ErrCode, GrocerError};
use serde::Serialize;
use thiserror::Error;

/// HTTP face of `GrocerError`. Every failure leaves the server as
/// `{ errCode, message }` with a matching status code.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct AppError(#[from] pub GrocerError);

impl AppError {
  pub fn bad_request(message: impl Into<String>) -> Self {
    AppError(GrocerError::Validation(message.into()))
  }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
  err_code: ErrCode,
  message: String,
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match &self.0 {
      GrocerError::Validation(_) => StatusCode::BAD_REQUEST,
      GrocerError::NotFound(_) => StatusCode::NOT_FOUND,
      GrocerError::Conflict(_) => StatusCode::CONFLICT,
      GrocerError::Auth(_) | GrocerError::Token(_) => StatusCode::UNAUTHORIZED,
      GrocerError::Forbidden(_) => StatusCode::FORBIDDEN,
      GrocerError::Email(_) => StatusCode::SERVICE_UNAVAILABLE,
      GrocerError::Config(_) | GrocerError::Database(_) | GrocerError::Migration(_) | GrocerError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    // Log the full error; the client only gets the public message.
    if status.is_server_error() {
      tracing::error!(application_error = %self.0, "Responding with error");
    } else {
      tracing::warn!(application_error = %self.0, "Responding with error");
    }
    HttpResponse::build(status).json(ErrorBody {
      err_code: self.0.err_code(),
      message: self.0.public_message(),
    })
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
