// grocer/src/services/user_service.rs

//! Accounts: registration, sign-in, profile and admin user management.

use crate::config::AppConfig;
use crate::error::{is_unique_violation, GrocerError, Result};
use crate::models::user::USER_COLUMNS;
use crate::models::{Page, PageRequest, Role, User};
use crate::services::auth_service;
use crate::services::mailer::{self, Mailer};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub email: String,
  pub password: String,
  pub full_name: String,
  pub phone: Option<String>,
  pub address: Option<String>,
}

/// Partial update. For `phone` and `address`, `Some(None)` (JSON `null`)
/// clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  pub full_name: Option<String>,
  #[serde(default, deserialize_with = "crate::models::nullable")]
  pub phone: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::models::nullable")]
  pub address: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
  pub user: User,
  pub token: String,
}

pub(crate) fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}

pub(crate) fn validate_email(email: &str) -> Result<()> {
  let at = email.find('@');
  match at {
    Some(i) if i > 0 && i < email.len() - 1 && !email.contains(char::is_whitespace) => Ok(()),
    _ => Err(GrocerError::Validation("Valid email is required.".to_string())),
  }
}

pub(crate) fn validate_password(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(GrocerError::Validation(format!(
      "Password must be at least {} characters long.",
      MIN_PASSWORD_LEN
    )));
  }
  Ok(())
}

pub(crate) async fn fetch_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
  let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?;
  Ok(user)
}

async fn insert_user(pool: &SqlitePool, new_user: &NewUser, password_hash: &str, role: Role) -> Result<User> {
  let now = Utc::now();
  let inserted = sqlx::query_as::<_, User>(&format!(
    "INSERT INTO users (id, email, password_hash, full_name, phone, address, role_id, reset_failed_attempts, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?) RETURNING {}",
    USER_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(normalize_email(&new_user.email))
  .bind(password_hash)
  .bind(new_user.full_name.trim())
  .bind(new_user.phone.as_deref())
  .bind(new_user.address.as_deref())
  .bind(role.id())
  .bind(now)
  .bind(now)
  .fetch_one(pool)
  .await;

  match inserted {
    Ok(user) => Ok(user),
    Err(e) if is_unique_violation(&e) => Err(GrocerError::Conflict(
      "An account with this email already exists.".to_string(),
    )),
    Err(e) => Err(e.into()),
  }
}

/// Creates a customer account and sends a welcome email.
///
/// The email is best effort: a failed send is logged and the account stays.
#[instrument(name = "user_service::register", skip(pool, mailer, config, new_user), fields(email = %new_user.email), err(Display))]
pub async fn register(pool: &SqlitePool, mailer: &dyn Mailer, config: &AppConfig, new_user: NewUser) -> Result<User> {
  let email = normalize_email(&new_user.email);
  validate_email(&email)?;
  validate_password(&new_user.password)?;
  if new_user.full_name.trim().is_empty() {
    return Err(GrocerError::Validation("Full name is required.".to_string()));
  }

  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
    .bind(&email)
    .fetch_one(pool)
    .await?;
  if exists {
    warn!("Attempt to register with existing email: {}", email);
    return Err(GrocerError::Conflict("An account with this email already exists.".to_string()));
  }

  let password_hash = auth_service::hash_password(&new_user.password)?;
  let user = insert_user(pool, &new_user, &password_hash, Role::Customer).await?;
  info!(user_id = %user.id, "User registered.");

  let welcome = mailer::welcome_email(&config.mail.sender, &user.email, &user.full_name);
  if let Err(e) = mailer.send(welcome).await {
    warn!(user_id = %user.id, error = %e, "Welcome email failed; registration kept.");
  }

  Ok(user)
}

/// Checks credentials and issues an access token.
#[instrument(name = "user_service::login", skip(pool, config, password), err(Display))]
pub async fn login(pool: &SqlitePool, config: &AppConfig, email: &str, password: &str) -> Result<LoginResult> {
  let invalid = || GrocerError::Auth("Invalid email or password.".to_string());

  let user = fetch_user_by_email(pool, email).await?.ok_or_else(invalid)?;
  if !auth_service::verify_password(&user.password_hash, password)? {
    warn!(user_id = %user.id, "Password mismatch on login.");
    return Err(invalid());
  }

  let token = auth_service::issue_token(user.id, user.role, &config.auth)?;
  info!(user_id = %user.id, "User signed in.");
  Ok(LoginResult { user, token })
}

pub async fn get_user(pool: &SqlitePool, user_id: Uuid) -> Result<User> {
  sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| GrocerError::NotFound(format!("User with ID {} not found.", user_id)))
}

#[instrument(name = "user_service::update_profile", skip(pool, update), err(Display))]
pub async fn update_profile(pool: &SqlitePool, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
  if let Some(name) = &update.full_name {
    if name.trim().is_empty() {
      return Err(GrocerError::Validation("Full name cannot be empty.".to_string()));
    }
  }

  sqlx::query_as::<_, User>(&format!(
    "UPDATE users SET full_name = COALESCE(?, full_name), \
     phone = CASE WHEN ? THEN ? ELSE phone END, \
     address = CASE WHEN ? THEN ? ELSE address END, \
     updated_at = ? WHERE id = ? RETURNING {}",
    USER_COLUMNS
  ))
  .bind(update.full_name.as_deref().map(str::trim))
  .bind(update.phone.is_some())
  .bind(update.phone.flatten())
  .bind(update.address.is_some())
  .bind(update.address.flatten())
  .bind(Utc::now())
  .bind(user_id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| GrocerError::NotFound(format!("User with ID {} not found.", user_id)))
}

#[instrument(name = "user_service::change_password", skip(pool, current_password, new_password), err(Display))]
pub async fn change_password(
  pool: &SqlitePool,
  user_id: Uuid,
  current_password: &str,
  new_password: &str,
) -> Result<()> {
  let user = get_user(pool, user_id).await?;
  if !auth_service::verify_password(&user.password_hash, current_password)? {
    return Err(GrocerError::Auth("Current password is incorrect.".to_string()));
  }
  validate_password(new_password)?;

  let password_hash = auth_service::hash_password(new_password)?;
  sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
    .bind(password_hash)
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await?;
  info!("Password changed.");
  Ok(())
}

pub async fn list_users(pool: &SqlitePool, page: &PageRequest) -> Result<Page<User>> {
  let (_, limit) = page.normalized();
  let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(pool).await?;
  let users = sqlx::query_as::<_, User>(&format!(
    "SELECT {} FROM users ORDER BY created_at DESC, email ASC LIMIT ? OFFSET ?",
    USER_COLUMNS
  ))
  .bind(limit)
  .bind(page.offset())
  .fetch_all(pool)
  .await?;
  Ok(Page::new(users, page, total))
}

#[instrument(name = "user_service::set_role", skip(pool), err(Display))]
pub async fn set_role(pool: &SqlitePool, user_id: Uuid, role: Role) -> Result<User> {
  sqlx::query_as::<_, User>(&format!(
    "UPDATE users SET role_id = ?, updated_at = ? WHERE id = ? RETURNING {}",
    USER_COLUMNS
  ))
  .bind(role.id())
  .bind(Utc::now())
  .bind(user_id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| GrocerError::NotFound(format!("User with ID {} not found.", user_id)))
}

/// Removes an account with its cart and reviews. Accounts with orders are
/// kept so order history stays intact.
#[instrument(name = "user_service::delete_user", skip(pool), err(Display))]
pub async fn delete_user(pool: &SqlitePool, user_id: Uuid) -> Result<()> {
  let mut tx = pool.begin().await?;

  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;
  if !exists {
    return Err(GrocerError::NotFound(format!("User with ID {} not found.", user_id)));
  }

  let has_orders: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE user_id = ?)")
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;
  if has_orders {
    return Err(GrocerError::Conflict(
      "User has orders and cannot be deleted.".to_string(),
    ));
  }

  sqlx::query("DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE user_id = ?)")
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
  sqlx::query("DELETE FROM carts WHERE user_id = ?")
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
  sqlx::query("DELETE FROM reviews WHERE user_id = ?")
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
  sqlx::query("DELETE FROM users WHERE id = ?")
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

  tx.commit().await?;
  info!("User deleted.");
  Ok(())
}

/// Makes sure an admin account with this email exists. An existing account
/// is promoted; its password is left untouched.
#[instrument(name = "user_service::ensure_admin", skip(pool, password), err(Display))]
pub async fn ensure_admin(pool: &SqlitePool, email: &str, password: &str) -> Result<User> {
  if let Some(existing) = fetch_user_by_email(pool, email).await? {
    if existing.role == Role::Admin {
      return Ok(existing);
    }
    return set_role(pool, existing.id, Role::Admin).await;
  }

  validate_email(&normalize_email(email))?;
  validate_password(password)?;
  let new_user = NewUser {
    email: email.to_string(),
    password: password.to_string(),
    full_name: "Administrator".to_string(),
    phone: None,
    address: None,
  };
  let password_hash = auth_service::hash_password(password)?;
  let admin = insert_user(pool, &new_user, &password_hash, Role::Admin).await?;
  info!(user_id = %admin.id, "Admin account created.");
  Ok(admin)
}
