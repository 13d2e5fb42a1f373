// tests/config_tests.rs
mod common;
use common::setup_tracing;
use grocer::{AppConfig, GrocerError};
use serial_test::serial;
use std::env;

const VARS: &[&str] = &[
  "SERVER_HOST",
  "SERVER_PORT",
  "DATABASE_URL",
  "JWT_SECRET",
  "JWT_TTL_HOURS",
  "RESET_CODE_TTL_MINUTES",
  "RESET_CODE_MAX_ATTEMPTS",
  "SHIPPING_FLAT_CENTS",
  "FREE_SHIPPING_THRESHOLD_CENTS",
  "LOG_FORMAT",
  "SEED_ADMIN_EMAIL",
  "SEED_ADMIN_PASSWORD",
];

fn clear_env() {
  for var in VARS {
    env::remove_var(var);
  }
}

#[test]
#[serial]
fn test_defaults_with_only_secret_set() {
  setup_tracing();
  clear_env();
  env::set_var("JWT_SECRET", "a-long-enough-secret");

  let config = AppConfig::from_env().unwrap();
  assert_eq!(config.server_address(), "127.0.0.1:8080");
  assert_eq!(config.auth.reset_code_ttl_minutes, 30);
  assert_eq!(config.auth.reset_code_max_attempts, 5);
  assert_eq!(config.shipping.shipping_for(10_000), 3000);
  assert!(!config.log_json);
  assert!(config.seed_admin_email.is_none());
  clear_env();
}

#[test]
#[serial]
fn test_missing_or_short_secret_is_rejected() {
  setup_tracing();
  clear_env();
  assert!(matches!(AppConfig::from_env(), Err(GrocerError::Config(_))));

  env::set_var("JWT_SECRET", "short");
  assert!(matches!(AppConfig::from_env(), Err(GrocerError::Config(_))));
  clear_env();
}

#[test]
#[serial]
fn test_overrides_are_parsed_and_checked() {
  setup_tracing();
  clear_env();
  env::set_var("JWT_SECRET", "a-long-enough-secret");
  env::set_var("SERVER_PORT", "9090");
  env::set_var("RESET_CODE_TTL_MINUTES", "15");
  env::set_var("LOG_FORMAT", "json");

  let config = AppConfig::from_env().unwrap();
  assert_eq!(config.server_port, 9090);
  assert_eq!(config.auth.reset_code_ttl_minutes, 15);
  assert!(config.log_json);

  env::set_var("SERVER_PORT", "not-a-port");
  assert!(AppConfig::from_env().is_err());
  env::set_var("SERVER_PORT", "9090");
  env::set_var("RESET_CODE_TTL_MINUTES", "0");
  assert!(AppConfig::from_env().is_err());
  env::set_var("RESET_CODE_TTL_MINUTES", "15");
  env::set_var("LOG_FORMAT", "xml");
  assert!(AppConfig::from_env().is_err());
  clear_env();
}
