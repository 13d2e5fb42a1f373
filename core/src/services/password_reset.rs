// grocer/src/services/password_reset.rs

//! Password reset by emailed six-digit code.
//!
//! The state lives in three nullable columns of `users`; `ResetState` is the
//! only place that reads or writes them.

use crate::config::{AppConfig, AuthSettings};
use crate::error::{GrocerError, Result};
use crate::models::User;
use crate::services::mailer::{self, Mailer};
use crate::services::{auth_service, user_service};
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetState {
  NoRequest,
  Issued {
    code: String,
    expires_at: DateTime<Utc>,
    failed_attempts: i64,
  },
}

/// Outcome of checking a supplied code against the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCheck {
  Verified,
  Expired,
  InvalidCode,
  /// Too many wrong codes; a new one has to be requested.
  Locked,
  NoRequest,
}

impl ResetState {
  pub fn of(user: &User) -> Self {
    match (&user.reset_code, user.reset_code_expires_at) {
      (Some(code), Some(expires_at)) => ResetState::Issued {
        code: code.clone(),
        expires_at,
        failed_attempts: user.reset_failed_attempts,
      },
      _ => ResetState::NoRequest,
    }
  }

  pub fn issue(now: DateTime<Utc>, ttl_minutes: i64) -> Self {
    ResetState::Issued {
      code: generate_code(),
      expires_at: now + Duration::minutes(ttl_minutes),
      failed_attempts: 0,
    }
  }

  /// Pure check. Expiry is inclusive: a code is still good at `expires_at`.
  pub fn check(&self, supplied: &str, now: DateTime<Utc>, max_attempts: i64) -> ResetCheck {
    match self {
      ResetState::NoRequest => ResetCheck::NoRequest,
      ResetState::Issued {
        code,
        expires_at,
        failed_attempts,
      } => {
        if *failed_attempts >= max_attempts {
          ResetCheck::Locked
        } else if now > *expires_at {
          ResetCheck::Expired
        } else if supplied.trim() != code {
          ResetCheck::InvalidCode
        } else {
          ResetCheck::Verified
        }
      }
    }
  }
}

/// Uniform six-digit code, zero padded.
pub fn generate_code() -> String {
  // Values in the top partial block of u32 are redrawn.
  const RANGE: u32 = 1_000_000;
  let zone = u32::MAX - (u32::MAX % RANGE);
  loop {
    let n = OsRng.next_u32();
    if n < zone {
      return format!("{:06}", n % RANGE);
    }
  }
}

async fn store_state(pool: &SqlitePool, user_id: Uuid, state: &ResetState) -> Result<()> {
  let (code, expires_at, attempts) = match state {
    ResetState::NoRequest => (None, None, 0),
    ResetState::Issued {
      code,
      expires_at,
      failed_attempts,
    } => (Some(code.as_str()), Some(*expires_at), *failed_attempts),
  };
  sqlx::query(
    "UPDATE users SET reset_code = ?, reset_code_expires_at = ?, reset_failed_attempts = ?, updated_at = ? WHERE id = ?",
  )
  .bind(code)
  .bind(expires_at)
  .bind(attempts)
  .bind(Utc::now())
  .bind(user_id)
  .execute(pool)
  .await?;
  Ok(())
}

async fn user_for_reset(pool: &SqlitePool, email: &str) -> Result<User> {
  user_service::fetch_user_by_email(pool, email)
    .await?
    .ok_or_else(|| GrocerError::NotFound("No account exists for this email.".to_string()))
}

/// Issues a fresh code (replacing any earlier one) and emails it.
///
/// When the email cannot be sent the user is put back to `NoRequest`.
#[instrument(name = "password_reset::request_reset", skip(pool, mailer, config), err(Display))]
pub async fn request_reset(pool: &SqlitePool, mailer: &dyn Mailer, config: &AppConfig, email: &str) -> Result<()> {
  let user = user_for_reset(pool, email).await?;
  let ttl = config.auth.reset_code_ttl_minutes;
  let state = ResetState::issue(Utc::now(), ttl);
  store_state(pool, user.id, &state).await?;

  let ResetState::Issued { code, .. } = &state else {
    return Err(GrocerError::Internal("Reset code was not issued.".to_string()));
  };
  let message = mailer::reset_code_email(&config.mail.sender, &user.email, code, ttl);
  if let Err(e) = mailer.send(message).await {
    warn!(user_id = %user.id, error = %e, "Reset code email failed; clearing the issued code.");
    store_state(pool, user.id, &ResetState::NoRequest).await?;
    return Err(GrocerError::Email(e.to_string()));
  }

  info!(user_id = %user.id, "Password reset code issued.");
  Ok(())
}

/// Bumps the failed-attempt counter in one statement.
///
/// Only the code that was checked is touched, so a guess racing a fresh
/// `request_reset` cannot bring the old code back or charge the new one.
async fn record_wrong_code(pool: &SqlitePool, user_id: Uuid, checked_code: &str) -> Result<()> {
  sqlx::query(
    "UPDATE users SET reset_failed_attempts = reset_failed_attempts + 1, updated_at = ? \
     WHERE id = ? AND reset_code = ?",
  )
  .bind(Utc::now())
  .bind(user_id)
  .bind(checked_code)
  .execute(pool)
  .await?;
  Ok(())
}

/// Maps a failed check to the error the caller sees and records a wrong code.
async fn enforce(pool: &SqlitePool, user: &User, state: &ResetState, outcome: ResetCheck) -> Result<()> {
  match outcome {
    ResetCheck::Verified => Ok(()),
    ResetCheck::NoRequest => Err(GrocerError::Validation(
      "No password reset was requested for this account.".to_string(),
    )),
    ResetCheck::Expired => Err(GrocerError::Validation(
      "The reset code has expired. Please request a new one.".to_string(),
    )),
    ResetCheck::Locked => Err(GrocerError::Validation(
      "Too many invalid attempts. Please request a new code.".to_string(),
    )),
    ResetCheck::InvalidCode => {
      if let ResetState::Issued { code, .. } = state {
        record_wrong_code(pool, user.id, code).await?;
      }
      warn!(user_id = %user.id, "Invalid password reset code supplied.");
      Err(GrocerError::Validation("Invalid reset code.".to_string()))
    }
  }
}

pub async fn verify_code(pool: &SqlitePool, settings: &AuthSettings, email: &str, code: &str) -> Result<()> {
  verify_code_at(pool, settings, email, code, Utc::now()).await
}

/// Checks a code without consuming it.
#[instrument(name = "password_reset::verify_code", skip(pool, settings, code), err(Display))]
pub async fn verify_code_at(
  pool: &SqlitePool,
  settings: &AuthSettings,
  email: &str,
  code: &str,
  now: DateTime<Utc>,
) -> Result<()> {
  let user = user_for_reset(pool, email).await?;
  let state = ResetState::of(&user);
  let outcome = state.check(code, now, settings.reset_code_max_attempts);
  enforce(pool, &user, &state, outcome).await
}

pub async fn reset_password(
  pool: &SqlitePool,
  settings: &AuthSettings,
  email: &str,
  code: &str,
  new_password: &str,
) -> Result<()> {
  reset_password_at(pool, settings, email, code, new_password, Utc::now()).await
}

/// Re-verifies the code, stores the new password and clears the reset state.
#[instrument(name = "password_reset::reset_password", skip(pool, settings, code, new_password), err(Display))]
pub async fn reset_password_at(
  pool: &SqlitePool,
  settings: &AuthSettings,
  email: &str,
  code: &str,
  new_password: &str,
  now: DateTime<Utc>,
) -> Result<()> {
  let user = user_for_reset(pool, email).await?;
  let state = ResetState::of(&user);
  let outcome = state.check(code, now, settings.reset_code_max_attempts);
  enforce(pool, &user, &state, outcome).await?;

  user_service::validate_password(new_password)?;
  let password_hash = auth_service::hash_password(new_password)?;

  // Code and attempt cap are checked again in SQL: two concurrent resets cannot
  // both consume the code, and wrong guesses recorded meanwhile still lock it.
  let result = sqlx::query(
    "UPDATE users SET password_hash = ?, reset_code = NULL, reset_code_expires_at = NULL, \
     reset_failed_attempts = 0, updated_at = ? WHERE id = ? AND reset_code = ? AND reset_failed_attempts < ?",
  )
  .bind(password_hash)
  .bind(Utc::now())
  .bind(user.id)
  .bind(code.trim())
  .bind(settings.reset_code_max_attempts)
  .execute(pool)
  .await?;
  if result.rows_affected() == 0 {
    return Err(GrocerError::Validation(
      "The reset code is no longer valid. Please request a new one.".to_string(),
    ));
  }

  info!(user_id = %user.id, "Password reset completed.");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn issued(code: &str, expires_at: DateTime<Utc>, failed_attempts: i64) -> ResetState {
    ResetState::Issued {
      code: code.to_string(),
      expires_at,
      failed_attempts,
    }
  }

  #[test]
  fn codes_are_six_digits() {
    for _ in 0..200 {
      let code = generate_code();
      assert_eq!(code.len(), 6);
      assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
  }

  #[test]
  fn issue_sets_expiry_from_ttl() {
    let now = Utc::now();
    match ResetState::issue(now, 30) {
      ResetState::Issued {
        expires_at,
        failed_attempts,
        ..
      } => {
        assert_eq!(expires_at, now + Duration::minutes(30));
        assert_eq!(failed_attempts, 0);
      }
      ResetState::NoRequest => panic!("expected an issued state"),
    }
  }

  #[test]
  fn check_outcomes() {
    let now = Utc::now();
    let state = issued("123456", now + Duration::minutes(30), 0);
    assert_eq!(state.check("123456", now, 5), ResetCheck::Verified);
    assert_eq!(state.check(" 123456 ", now, 5), ResetCheck::Verified);
    assert_eq!(state.check("654321", now, 5), ResetCheck::InvalidCode);
    assert_eq!(
      state.check("123456", now + Duration::minutes(31), 5),
      ResetCheck::Expired
    );
    assert_eq!(
      state.check("123456", now + Duration::minutes(30), 5),
      ResetCheck::Verified
    );
    assert_eq!(ResetState::NoRequest.check("123456", now, 5), ResetCheck::NoRequest);
  }

  #[test]
  fn attempts_cap_locks_even_the_right_code() {
    let now = Utc::now();
    let state = issued("123456", now + Duration::minutes(30), 5);
    assert_eq!(state.check("123456", now, 5), ResetCheck::Locked);
  }
}
