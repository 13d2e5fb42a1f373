// grocer/src/error.rs
use serde::Serialize;
use thiserror::Error;

/// Numeric status carried in every JSON envelope next to the HTTP status.
///
/// One shared table for the whole API; `0` is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum ErrCode {
  Ok = 0,
  Internal = 1,
  Validation = 2,
  NotFound = 3,
  Conflict = 4,
  Unauthorized = 5,
  Forbidden = 6,
}

impl From<ErrCode> for u8 {
  fn from(code: ErrCode) -> Self {
    code as u8
  }
}

#[derive(Debug, Error)]
pub enum GrocerError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Token Error: {0}")]
  Token(#[from] jsonwebtoken::errors::Error),

  #[error("Email Error: {0}")]
  Email(String),

  #[error("Internal Error: {0}")]
  Internal(String),
}

impl GrocerError {
  pub fn err_code(&self) -> ErrCode {
    match self {
      GrocerError::Validation(_) => ErrCode::Validation,
      GrocerError::NotFound(_) => ErrCode::NotFound,
      GrocerError::Conflict(_) => ErrCode::Conflict,
      GrocerError::Auth(_) | GrocerError::Token(_) => ErrCode::Unauthorized,
      GrocerError::Forbidden(_) => ErrCode::Forbidden,
      GrocerError::Config(_)
      | GrocerError::Database(_)
      | GrocerError::Migration(_)
      | GrocerError::Email(_)
      | GrocerError::Internal(_) => ErrCode::Internal,
    }
  }

  /// Message safe to hand to a client. Driver and infrastructure errors are
  /// replaced with a generic text; the full error only goes to the log.
  pub fn public_message(&self) -> String {
    match self {
      GrocerError::Validation(m)
      | GrocerError::NotFound(m)
      | GrocerError::Conflict(m)
      | GrocerError::Auth(m)
      | GrocerError::Forbidden(m) => m.clone(),
      GrocerError::Token(_) => "Invalid or expired token.".to_string(),
      GrocerError::Email(_) => "Email could not be sent.".to_string(),
      GrocerError::Database(_) | GrocerError::Migration(_) => "Database operation failed.".to_string(),
      GrocerError::Config(_) | GrocerError::Internal(_) => "An internal error occurred.".to_string(),
    }
  }
}

/// True when the driver reports a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
  match err {
    sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
    _ => false,
  }
}

pub type Result<T, E = GrocerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn database_errors_do_not_leak_driver_text() {
    let err = GrocerError::Database(sqlx::Error::RowNotFound);
    assert_eq!(err.err_code(), ErrCode::Internal);
    assert_eq!(err.public_message(), "Database operation failed.");
  }

  #[test]
  fn business_errors_keep_their_message() {
    let err = GrocerError::Conflict("You have already reviewed this product.".to_string());
    assert_eq!(err.err_code(), ErrCode::Conflict);
    assert_eq!(err.public_message(), "You have already reviewed this product.");
  }

  #[test]
  fn err_code_serializes_as_number() {
    assert_eq!(serde_json::to_string(&ErrCode::NotFound).unwrap(), "3");
  }
}
