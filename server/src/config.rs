// aquabulk/server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!("Invalid STORE_BACKEND '{}': expected postgres or memory", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" | "text" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected pretty or json", other))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  /// Required when `store_backend` is `Postgres`.
  pub database_url: Option<String>,
  pub db_max_connections: u32,
  /// Upper bound on waiting for a listing's row lock.
  pub lock_wait: Duration,
  pub run_migrations: bool,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = get_or("SERVER_PORT", "8080")
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let store_backend = get_or("STORE_BACKEND", "postgres").parse::<StoreBackend>()?;
    let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required for STORE_BACKEND=postgres)".to_string(),
      ));
    }
    let db_max_connections = get_or("DB_MAX_CONNECTIONS", "10")
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid DB_MAX_CONNECTIONS: {}", e)))?;
    let lock_wait_ms = get_or("LOCK_WAIT_MS", "5000")
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid LOCK_WAIT_MS: {}", e)))?;
    if lock_wait_ms == 0 {
      return Err(AppError::Config("LOCK_WAIT_MS must be greater than zero".to_string()));
    }
    let run_migrations = get_or("RUN_MIGRATIONS", "true")
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid RUN_MIGRATIONS value: {}", e)))?;
    let log_format = get_or("LOG_FORMAT", "pretty").parse::<LogFormat>()?;

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      db_max_connections,
      lock_wait: Duration::from_millis(lock_wait_ms),
      run_migrations,
      log_format,
    })
  }

  /// In-memory configuration with defaults; used by tests and local runs.
  pub fn in_memory() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      store_backend: StoreBackend::Memory,
      database_url: None,
      db_max_connections: 10,
      lock_wait: aquabulk::DEFAULT_LOCK_WAIT,
      run_migrations: false,
      log_format: LogFormat::Pretty,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
  }

  #[test]
  fn defaults_apply_for_memory_backend() {
    let cfg = AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory")])).unwrap();
    assert_eq!(cfg.server_host, "127.0.0.1");
    assert_eq!(cfg.server_port, 8080);
    assert_eq!(cfg.lock_wait, Duration::from_millis(5000));
    assert_eq!(cfg.db_max_connections, 10);
    assert!(cfg.run_migrations);
    assert_eq!(cfg.log_format, LogFormat::Pretty);
    assert!(cfg.database_url.is_none());
  }

  #[test]
  fn postgres_backend_requires_database_url() {
    assert!(matches!(AppConfig::from_lookup(lookup(&[])), Err(AppError::Config(_))));
    let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/aquabulk")])).unwrap();
    assert_eq!(cfg.store_backend, StoreBackend::Postgres);
  }

  #[test]
  fn invalid_values_are_config_errors() {
    for (key, value) in [
      ("SERVER_PORT", "eighty"),
      ("LOCK_WAIT_MS", "0"),
      ("LOCK_WAIT_MS", "-5"),
      ("STORE_BACKEND", "redis"),
      ("LOG_FORMAT", "xml"),
      ("RUN_MIGRATIONS", "maybe"),
    ] {
      let vars = [("STORE_BACKEND", "memory"), (key, value)];
      // Later entries win in the map, so the bad value overrides the default backend.
      assert!(
        matches!(AppConfig::from_lookup(lookup(&vars)), Err(AppError::Config(_))),
        "{}={} should be rejected",
        key,
        value
      );
    }
  }
}
