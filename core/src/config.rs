// grocer/src/config.rs

use crate::error::{GrocerError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

/// Settings for token issuance and password reset.
#[derive(Debug, Clone)]
pub struct AuthSettings {
  pub jwt_secret: String,
  pub token_ttl_hours: i64,
  pub reset_code_ttl_minutes: i64,
  pub reset_code_max_attempts: i64,
}

/// How shipping is charged on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
  pub flat_cents: i64,
  /// Subtotal at or above which shipping is free. `0` disables the rule.
  pub free_threshold_cents: i64,
}

impl ShippingPolicy {
  pub fn shipping_for(&self, subtotal_cents: i64) -> i64 {
    if self.free_threshold_cents > 0 && subtotal_cents >= self.free_threshold_cents {
      0
    } else {
      self.flat_cents
    }
  }
}

#[derive(Debug, Clone)]
pub struct MailSettings {
  pub sender: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub auth: AuthSettings,
  pub shipping: ShippingPolicy,
  pub mail: MailSettings,

  // Ensured at startup when both are present.
  pub seed_admin_email: Option<String>,
  pub seed_admin_password: Option<String>,

  pub log_json: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let server_host = optional("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parsed("SERVER_PORT", 8080u16)?;
    let database_url = optional("DATABASE_URL").unwrap_or_else(|| "sqlite://grocer.db?mode=rwc".to_string());
    let database_max_connections = parsed("DATABASE_MAX_CONNECTIONS", 5u32)?;

    let jwt_secret = optional("JWT_SECRET")
      .ok_or_else(|| GrocerError::Config("Missing environment variable 'JWT_SECRET'".to_string()))?;
    if jwt_secret.len() < 16 {
      return Err(GrocerError::Config(
        "JWT_SECRET must be at least 16 characters long".to_string(),
      ));
    }

    let auth = AuthSettings {
      jwt_secret,
      token_ttl_hours: positive("JWT_TTL_HOURS", 24)?,
      reset_code_ttl_minutes: positive("RESET_CODE_TTL_MINUTES", 30)?,
      reset_code_max_attempts: positive("RESET_CODE_MAX_ATTEMPTS", 5)?,
    };

    let shipping = ShippingPolicy {
      flat_cents: parsed("SHIPPING_FLAT_CENTS", 3000i64)?,
      free_threshold_cents: parsed("FREE_SHIPPING_THRESHOLD_CENTS", 50000i64)?,
    };
    if shipping.flat_cents < 0 || shipping.free_threshold_cents < 0 {
      return Err(GrocerError::Config("Shipping amounts cannot be negative".to_string()));
    }

    let mail = MailSettings {
      sender: optional("MAIL_SENDER").unwrap_or_else(|| "noreply@grocer.local".to_string()),
    };

    let log_json = match optional("LOG_FORMAT").as_deref() {
      None | Some("text") => false,
      Some("json") => true,
      Some(other) => {
        return Err(GrocerError::Config(format!(
          "Invalid LOG_FORMAT '{}', expected 'text' or 'json'",
          other
        )))
      }
    };

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      auth,
      shipping,
      mail,
      seed_admin_email: optional("SEED_ADMIN_EMAIL"),
      seed_admin_password: optional("SEED_ADMIN_PASSWORD"),
      log_json,
    })
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }

  /// Configuration for tests and tools that never touch the environment.
  pub fn for_tests() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      database_url: "sqlite::memory:".to_string(),
      database_max_connections: 1,
      auth: AuthSettings {
        jwt_secret: "test-secret-test-secret".to_string(),
        token_ttl_hours: 1,
        reset_code_ttl_minutes: 30,
        reset_code_max_attempts: 5,
      },
      shipping: ShippingPolicy {
        flat_cents: 3000,
        free_threshold_cents: 50000,
      },
      mail: MailSettings {
        sender: "noreply@grocer.test".to_string(),
      },
      seed_admin_email: None,
      seed_admin_password: None,
      log_json: false,
    }
  }
}

fn optional(var_name: &str) -> Option<String> {
  env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match optional(var_name) {
    None => Ok(default),
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| GrocerError::Config(format!("Invalid {}: {}", var_name, e))),
  }
}

fn positive(var_name: &str, default: i64) -> Result<i64> {
  let value = parsed(var_name, default)?;
  if value <= 0 {
    return Err(GrocerError::Config(format!("{} must be positive", var_name)));
  }
  Ok(value)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shipping_is_free_at_threshold() {
    let policy = ShippingPolicy {
      flat_cents: 3000,
      free_threshold_cents: 50000,
    };
    assert_eq!(policy.shipping_for(49999), 3000);
    assert_eq!(policy.shipping_for(50000), 0);
  }

  #[test]
  fn zero_threshold_always_charges() {
    let policy = ShippingPolicy {
      flat_cents: 1500,
      free_threshold_cents: 0,
    };
    assert_eq!(policy.shipping_for(1_000_000), 1500);
  }
}
