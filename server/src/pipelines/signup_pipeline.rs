// aquabulk/server/src/pipelines/signup_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::SignupCtxData;
use crate::services::auth_service;
use crate::state::AppState;
use aquabulk::model::Role;
use aquabulk::{Flow, FlowContext, FlowRegistry, StepControl};
use std::sync::Arc;
use tracing::{event, info, warn, Level};

/// Registers the user sign-up flow.
pub fn register_signup_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut signup_p = Flow::<SignupCtxData, AppError>::new(&[
    ("validate_signup_input", false, None),
    ("create_user", false, None),
  ]);

  signup_p.on_root("validate_signup_input", |ctx_data: FlowContext<SignupCtxData>| {
    Box::pin(async move {
      let (username_val, role_val) = {
        let guard = ctx_data.read();
        (guard.username.clone(), guard.role.clone())
      };

      event!(Level::DEBUG, username = %username_val, "Validating signup input.");
      if username_val.trim().is_empty() {
        warn!("Empty username provided for signup.");
        return Err(AppError::Validation("Username is required.".to_string()));
      }
      if let Err(e) = role_val.parse::<Role>() {
        warn!(error = %e, "Invalid role provided for signup.");
        return Err(AppError::Validation("Role must be 'seller' or 'buyer'.".to_string()));
      }
      Ok(StepControl::Continue)
    })
  });

  // Hashing happens here so the plain password never leaves the flow.
  signup_p.on_root("create_user", |ctx_data: FlowContext<SignupCtxData>| {
    Box::pin(async move {
      let (accounts, username_val, password_val, role_val) = {
        let guard = ctx_data.read();
        (
          guard.app_state.market.accounts.clone(),
          guard.username.clone(),
          guard.password.clone(),
          guard.role.clone(),
        )
      };
      let role = role_val.parse::<Role>().map_err(AppError::Validation)?;
      let password_hash = auth_service::hash_password_blocking(password_val).await?;

      let user = accounts.register(&username_val, password_hash, role).await?;
      info!(user_id = %user.id, role = %user.role, "User created via signup flow.");
      ctx_data.write().created_user = Some(user);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  registry.register_flow(signup_p);
}
