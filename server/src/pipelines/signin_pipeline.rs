// aquabulk/server/src/pipelines/signin_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::SigninCtxData;
use crate::services::auth_service;
use crate::state::AppState;
use aquabulk::{Flow, FlowContext, FlowRegistry, MarketError, StepControl};
use std::sync::Arc;
use tracing::{event, warn, Level};

/// Registers the credential-check flow.
///
/// Token issuance belongs to the upstream gateway; a completed flow means the
/// credentials matched and `user` holds the account the gateway should vouch for.
pub fn register_signin_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut signin_p = Flow::<SigninCtxData, AppError>::new(&[
    ("validate_signin_input", false, None),
    ("fetch_user_signin", false, None),
    ("verify_user_password_signin", false, None),
  ]);

  signin_p.on_root("validate_signin_input", |ctx_data: FlowContext<SigninCtxData>| {
    Box::pin(async move {
      let (username_empty, password_empty) = {
        let guard = ctx_data.read();
        (guard.username.trim().is_empty(), guard.password.is_empty())
      };
      if username_empty || password_empty {
        warn!("Incomplete credentials provided for sign-in.");
        return Err(AppError::Validation("Username and password are required.".to_string()));
      }
      Ok(StepControl::Continue)
    })
  });

  signin_p.on_root("fetch_user_signin", |ctx_data: FlowContext<SigninCtxData>| {
    Box::pin(async move {
      let (accounts, username_val) = {
        let guard = ctx_data.read();
        (guard.app_state.market.accounts.clone(), guard.username.clone())
      };

      match accounts.find_by_username(&username_val).await? {
        Some(user) => {
          event!(Level::DEBUG, user_id = %user.id, "User found for signin.");
          ctx_data.write().user = Some(user);
          Ok(StepControl::Continue)
        }
        None => {
          warn!(username = %username_val, "User not found during signin.");
          Err(AppError::Market(MarketError::NotFound("User not found.".to_string())))
        }
      }
    })
  });

  signin_p.on_root("verify_user_password_signin", |ctx_data: FlowContext<SigninCtxData>| {
    Box::pin(async move {
      let (stored_hash, password_val) = {
        let guard = ctx_data.read();
        (guard.user.as_ref().map(|u| u.password_hash.clone()), guard.password.clone())
      };
      let stored_hash = stored_hash.ok_or_else(|| {
        event!(Level::ERROR, "User missing in context for password verification.");
        AppError::Internal("User unexpectedly missing for verification.".to_string())
      })?;

      if !auth_service::verify_password_blocking(stored_hash, password_val).await? {
        warn!("Password mismatch during signin.");
        return Err(AppError::Auth("Invalid credentials.".to_string()));
      }
      ctx_data.write().authenticated = true;
      Ok(StepControl::Continue)
    })
  });

  registry.register_flow(signin_p);
}
