// grocer/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account role. Ids match the rows seeded into `roles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Customer,
}

impl Role {
  pub fn id(self) -> i64 {
    match self {
      Role::Admin => 1,
      Role::Customer => 2,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Customer => "customer",
    }
  }
}

impl TryFrom<i64> for Role {
  type Error = String;

  fn try_from(id: i64) -> Result<Self, Self::Error> {
    match id {
      1 => Ok(Role::Admin),
      2 => Ok(Role::Customer),
      other => Err(format!("unknown role id {}", other)),
    }
  }
}

impl FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "admin" => Ok(Role::Admin),
      "customer" => Ok(Role::Customer),
      other => Err(format!("unknown role '{}'", other)),
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: Uuid,
  pub email: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub full_name: String,
  pub phone: Option<String>,
  pub address: Option<String>,
  #[sqlx(rename = "role_id", try_from = "i64")]
  pub role: Role,
  // Reset columns are read through `password_reset::ResetState` only.
  #[serde(skip_serializing)]
  pub reset_code: Option<String>,
  #[serde(skip_serializing)]
  pub reset_code_expires_at: Option<DateTime<Utc>>,
  #[serde(skip_serializing)]
  pub reset_failed_attempts: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub(crate) const USER_COLUMNS: &str = "id, email, password_hash, full_name, phone, address, role_id, \
   reset_code, reset_code_expires_at, reset_failed_attempts, created_at, updated_at";
