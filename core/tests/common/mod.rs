// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset.

use async_trait::async_trait;
use grocer::models::{NewVariant, ProductDetail, User};
use grocer::services::admin_product_service::{self, NewProduct};
use grocer::services::user_service::{self, NewUser};
use grocer::{AppConfig, GrocerError, LogMailer, Mailer, OutgoingEmail, SentEmail};
use sqlx::SqlitePool;
use std::sync::Mutex;
use tracing::Level;

// --- Tracing ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Database ---
pub async fn test_pool() -> SqlitePool {
  setup_tracing();
  grocer::db::connect_in_memory().await.expect("in-memory database")
}

pub fn test_config() -> AppConfig {
  AppConfig::for_tests()
}

// --- Mailers ---

/// Keeps every message so tests can read the reset code.
#[derive(Default)]
pub struct RecordingMailer {
  pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
  pub fn last_to(&self, to: &str) -> Option<OutgoingEmail> {
    self.sent.lock().unwrap().iter().rev().find(|m| m.to == to).cloned()
  }

  pub fn count(&self) -> usize {
    self.sent.lock().unwrap().len()
  }
}

#[async_trait]
impl Mailer for RecordingMailer {
  async fn send(&self, email: OutgoingEmail) -> grocer::Result<SentEmail> {
    let sent = SentEmail {
      to: email.to.clone(),
      subject: email.subject.clone(),
      body_preview: email.html_body.chars().take(50).collect(),
      message_id: format!("recorded_{}", self.count()),
    };
    self.sent.lock().unwrap().push(email);
    Ok(sent)
  }
}

/// Always fails, like an unreachable SMTP relay.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
  async fn send(&self, _email: OutgoingEmail) -> grocer::Result<SentEmail> {
    Err(GrocerError::Email("relay unreachable".to_string()))
  }
}

/// Pulls the six-digit code out of a reset email body.
pub fn code_from(email: &OutgoingEmail) -> String {
  let start = email.html_body.find("<strong>").expect("code marker") + "<strong>".len();
  email.html_body[start..start + 6].to_string()
}

// --- Fixtures ---
pub const PASSWORD: &str = "correct-horse";

pub async fn create_customer(pool: &SqlitePool, email: &str) -> User {
  user_service::register(
    pool,
    &LogMailer,
    &test_config(),
    NewUser {
      email: email.to_string(),
      password: PASSWORD.to_string(),
      full_name: format!("Customer {}", email),
      phone: None,
      address: None,
    },
  )
  .await
  .expect("register customer")
}

pub fn new_product(name: &str, price_cents: i64) -> NewProduct {
  NewProduct {
    name: name.to_string(),
    price_cents,
    ..Default::default()
  }
}

pub async fn create_product(pool: &SqlitePool, name: &str, price_cents: i64) -> ProductDetail {
  admin_product_service::create_product(pool, new_product(name, price_cents))
    .await
    .expect("create product")
}

pub fn sized(size_id: i64, stock: i64) -> NewVariant {
  NewVariant {
    size_id: Some(size_id),
    stock: Some(stock),
  }
}

pub async fn size_id(pool: &SqlitePool, name: &str) -> i64 {
  sqlx::query_scalar("SELECT id FROM sizes WHERE name = ?")
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("seeded size")
}
