// grocer_server/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use grocer::services::user_service;
use grocer::{db, AppConfig, LogMailer};
use grocer_server::{configure_app_routes, AppState};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
  // RUST_LOG overrides the default level.
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = Arc::new(AppConfig::from_env().context("Failed to load application configuration")?);
  init_tracing(app_config.log_json);
  tracing::info!("Starting Grocer API server...");

  let db_pool = db::connect(&app_config.database_url, app_config.database_max_connections)
    .await
    .context("Failed to connect to the database")?;
  db::migrate(&db_pool).await.context("Failed to apply migrations")?;

  if let (Some(email), Some(password)) = (&app_config.seed_admin_email, &app_config.seed_admin_password) {
    let admin = user_service::ensure_admin(&db_pool, email, password)
      .await
      .context("Failed to seed the admin account")?;
    tracing::info!(user_id = %admin.id, "Admin account ensured.");
  }

  let app_state = AppState {
    db_pool,
    config: app_config.clone(),
    mailer: Arc::new(LogMailer),
  };

  let server_address = app_config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("Failed to bind {}", server_address))?
  .run()
  .await
  .context("Server terminated with an error")?;

  Ok(())
}
