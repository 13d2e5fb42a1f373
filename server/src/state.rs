// grocer_server/src/state.rs
use grocer::{AppConfig, Mailer};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: SqlitePool,
  pub config: Arc<AppConfig>, // Loaded once at startup
  pub mailer: Arc<dyn Mailer>,
}
