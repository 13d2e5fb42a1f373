// grocer/src/services/auth_service.rs

//! Password hashing and access tokens.

use crate::config::AuthSettings;
use crate::error::GrocerError;
use crate::models::Role;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// Hashes a plain-text password using Argon2.
///
/// # Returns
/// The PHC-format hash string, or a validation error for an empty password.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, GrocerError> {
  debug!("Attempting to hash password.");
  if password.is_empty() {
    error!("Password hashing failed: Password cannot be empty.");
    return Err(GrocerError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(password_hash_obj) => Ok(password_hash_obj.to_string()),
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(GrocerError::Internal(format!("Password hashing failed: {}", argon_err)))
    }
  }
}

/// Verifies a plain-text password against a stored Argon2 hash.
///
/// A mismatch is `Ok(false)`; only a malformed stored hash is an error.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(hashed_password_str: &str, provided_password: &str) -> Result<bool, GrocerError> {
  if provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(hashed_password_str).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    GrocerError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: Passwords do not match.");
      Ok(false)
    }
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 password verification process encountered an error.");
      Err(GrocerError::Internal(format!(
        "Password verification process failed: {}",
        other_argon_err
      )))
    }
  }
}

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub sub: Uuid,
  pub role: Role,
  pub iat: i64,
  pub exp: i64,
}

#[instrument(name = "auth_service::issue_token", skip_all, fields(%user_id, %role), err(Display))]
pub fn issue_token(user_id: Uuid, role: Role, settings: &AuthSettings) -> Result<String, GrocerError> {
  let now = Utc::now();
  let claims = Claims {
    sub: user_id,
    role,
    iat: now.timestamp(),
    exp: (now + Duration::hours(settings.token_ttl_hours)).timestamp(),
  };
  let token = encode(
    &Header::default(),
    &claims,
    &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
  )?;
  Ok(token)
}

/// Checks signature and expiry and returns the claims.
pub fn decode_token(token: &str, settings: &AuthSettings) -> Result<Claims, GrocerError> {
  let data = decode::<Claims>(
    token,
    &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
    &Validation::default(),
  )?;
  Ok(data.claims)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn settings(secret: &str) -> AuthSettings {
    AuthSettings {
      jwt_secret: secret.to_string(),
      token_ttl_hours: 1,
      reset_code_ttl_minutes: 30,
      reset_code_max_attempts: 5,
    }
  }

  #[test]
  fn hash_then_verify() {
    let hash = hash_password("correct horse").unwrap();
    assert!(verify_password(&hash, "correct horse").unwrap());
    assert!(!verify_password(&hash, "wrong horse").unwrap());
    assert!(!verify_password(&hash, "").unwrap());
  }

  #[test]
  fn empty_password_is_rejected() {
    assert!(matches!(hash_password(""), Err(GrocerError::Validation(_))));
  }

  #[test]
  fn token_carries_user_and_role() {
    let s = settings("unit-test-secret-0001");
    let user_id = Uuid::new_v4();
    let token = issue_token(user_id, Role::Admin, &s).unwrap();
    let claims = decode_token(&token, &s).unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.role, Role::Admin);
    assert!(claims.exp > claims.iat);
  }

  #[test]
  fn token_signed_with_other_secret_is_rejected() {
    let token = issue_token(Uuid::new_v4(), Role::Customer, &settings("unit-test-secret-0001")).unwrap();
    let err = decode_token(&token, &settings("unit-test-secret-0002")).unwrap_err();
    assert!(matches!(err, GrocerError::Token(_)));
  }
}
