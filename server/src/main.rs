// aquabulk/server/src/main.rs

use aquabulk::store::{MemoryStore, PostgresStore};
use aquabulk::Market;
use aquabulk_server::{configure_app_routes, AppConfig, AppState, LogFormat, StoreBackend};

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

fn init_tracing(format: LogFormat) {
  let builder = tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

async fn build_market(config: &AppConfig) -> std::io::Result<Market> {
  match config.store_backend {
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory store; data is lost on shutdown.");
      Ok(Market::in_memory(MemoryStore::with_lock_wait(config.lock_wait)))
    }
    StoreBackend::Postgres => {
      let url = config.database_url.as_deref().unwrap_or_default();
      let store = PostgresStore::connect(url, config.db_max_connections, config.lock_wait)
        .await
        .map_err(|e| {
          tracing::error!(error = %e, "Failed to connect to the database.");
          std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;
      if config.run_migrations {
        store.migrate().await.map_err(|e| {
          tracing::error!(error = %e, "Failed to apply database migrations.");
          std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;
      }
      Ok(Market::new(Arc::new(store)))
    }
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Config is read before the subscriber exists so it can pick the log format.
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      eprintln!("Configuration error: {}", e);
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!(backend = ?app_config.store_backend, lock_wait = ?app_config.lock_wait, "Starting marketplace server...");

  let market = build_market(&app_config).await?;
  let app_state = AppState::build(market, app_config.clone());
  tracing::info!("Flows registered.");

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
