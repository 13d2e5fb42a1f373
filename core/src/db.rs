// grocer/src/db.rs

//! Pool construction and schema migrations.

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{info, instrument};

#[instrument(name = "db::connect", skip(database_url), err(Display))]
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
  let options = SqliteConnectOptions::from_str(database_url)?
    .create_if_missing(true)
    .foreign_keys(true);

  let pool = SqlitePoolOptions::new()
    .max_connections(max_connections.max(1))
    .connect_with(options)
    .await?;
  info!("Connected to the database.");
  Ok(pool)
}

/// A private in-memory database with the schema applied.
///
/// Every SQLite in-memory connection is its own database, so the pool is
/// pinned to exactly one connection that is never recycled.
pub async fn connect_in_memory() -> Result<SqlitePool> {
  let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
  let pool = SqlitePoolOptions::new()
    .min_connections(1)
    .max_connections(1)
    .idle_timeout(None)
    .max_lifetime(None)
    .connect_with(options)
    .await?;
  migrate(&pool).await?;
  Ok(pool)
}

#[instrument(name = "db::migrate", skip(pool), err(Display))]
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
  sqlx::migrate!("./migrations").run(pool).await?;
  info!("Database migrations applied.");
  Ok(())
}

/// Liveness check for the health endpoint.
pub async fn ping(pool: &SqlitePool) -> Result<()> {
  sqlx::query("SELECT 1").execute(pool).await?;
  Ok(())
}
