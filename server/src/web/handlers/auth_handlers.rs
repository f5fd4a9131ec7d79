// aquabulk/server/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::{missing_result, run_flow};
use crate::errors::AppError;
use crate::pipelines::contexts::{SigninCtxData, SignupCtxData};
use crate::state::AppState;

// --- Request DTOs ---
#[derive(Deserialize)]
pub struct RegisterRequestPayload {
  pub username: String,
  pub password: String,
  pub role: String,
}

#[derive(Deserialize)]
pub struct LoginRequestPayload {
  pub username: String,
  pub password: String,
}

#[instrument(
    name = "handler::register",
    skip(app_state, req_payload),
    fields(username = %req_payload.username, role = %req_payload.role)
)]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RegisterRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let req = req_payload.into_inner();
  let ctx_data = run_flow(
    app_state.get_ref(),
    SignupCtxData {
      app_state: app_state.get_ref().clone(),
      username: req.username,
      password: req.password,
      role: req.role,
      created_user: None,
    },
  )
  .await?;

  let user = ctx_data
    .read()
    .created_user
    .clone()
    .ok_or_else(|| missing_result("signup", "created_user"))?;
  info!(user_id = %user.id, "Registration successful.");

  Ok(HttpResponse::Created().json(json!({
    "message": "User registered successfully.",
    "user_id": user.id,
    "username": user.username,
    "role": user.role,
  })))
}

/// Checks credentials. Issuing a token is the gateway's job; the response
/// carries the identity it should vouch for.
#[instrument(name = "handler::login", skip(app_state, req_payload), fields(username = %req_payload.username))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<LoginRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let req = req_payload.into_inner();
  let ctx_data = run_flow(
    app_state.get_ref(),
    SigninCtxData {
      app_state: app_state.get_ref().clone(),
      username: req.username,
      password: req.password,
      user: None,
      authenticated: false,
    },
  )
  .await?;

  let (user, authenticated) = {
    let guard = ctx_data.read();
    (guard.user.clone(), guard.authenticated)
  };
  let user = match (user, authenticated) {
    (Some(user), true) => user,
    _ => return Err(AppError::Auth("Invalid credentials.".to_string())),
  };
  info!(user_id = %user.id, "Login successful.");

  Ok(HttpResponse::Ok().json(json!({
    "message": "Login successful.",
    "user_id": user.id,
    "username": user.username,
    "role": user.role,
  })))
}
