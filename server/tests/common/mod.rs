// aquabulk/server/tests/common/mod.rs
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use aquabulk::model::Role;
use aquabulk::store::MemoryStore;
use aquabulk::Market;
use aquabulk_server::services::auth_service;
use aquabulk_server::{AppConfig, AppState};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

pub const PASSWORD: &str = "secret-pass";

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

/// Application state over a fresh in-memory store.
pub fn test_state() -> AppState {
  test_state_with_lock_wait(aquabulk::DEFAULT_LOCK_WAIT)
}

pub fn test_state_with_lock_wait(lock_wait: Duration) -> AppState {
  setup_tracing();
  let mut config = AppConfig::in_memory();
  config.lock_wait = lock_wait;
  AppState::build(Market::in_memory(MemoryStore::with_lock_wait(lock_wait)), Arc::new(config))
}

/// Adds the gateway's principal headers to `req`.
pub fn as_principal(req: TestRequest, user_id: Uuid, role: &str) -> TestRequest {
  req
    .insert_header(("X-User-ID", user_id.to_string()))
    .insert_header(("X-User-Role", role.to_string()))
}

/// Sends `req` and returns the status with the decoded JSON body (`Null` if empty).
pub async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
  S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
  B: MessageBody,
{
  let resp = test::call_service(app, req).await;
  let status = resp.status();
  let body = test::read_body(resp).await;
  let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
  (status, value)
}

/// Registers a user straight through the account directory and returns its id.
pub async fn register(state: &AppState, username: &str, role: Role) -> Uuid {
  let hash = auth_service::hash_password(PASSWORD).unwrap();
  state.market.accounts.register(username, hash, role).await.unwrap().id
}

pub fn uuid_field(body: &Value, field: &str) -> Uuid {
  body[field]
    .as_str()
    .and_then(|s| Uuid::parse_str(s).ok())
    .unwrap_or_else(|| panic!("missing uuid field '{}' in {}", field, body))
}
