// aquabulk/server/src/pipelines/mod.rs

//! Defines and registers every flow the HTTP layer runs.

use crate::errors::AppError;
use crate::state::AppState;
use aquabulk::FlowRegistry;
use std::sync::Arc;

pub mod common_steps;
pub mod contexts;

pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod purchase_pipeline;
pub mod query_pipeline;
pub mod restock_pipeline;
pub mod signin_pipeline;
pub mod signup_pipeline;

/// Registers all flows with `registry`. Called once while building `AppState`.
pub fn register_all_pipelines(registry: &Arc<FlowRegistry<AppError>>, app_state: &AppState) {
  tracing::info!("Registering flows...");

  signup_pipeline::register_signup_pipeline(registry, app_state);
  signin_pipeline::register_signin_pipeline(registry, app_state);
  restock_pipeline::register_restock_pipeline(registry, app_state);
  purchase_pipeline::register_purchase_pipeline(registry, app_state);
  cart_pipeline::register_add_to_cart_pipeline(registry, app_state);
  cart_pipeline::register_clear_cart_pipeline(registry, app_state);
  checkout_pipeline::register_checkout_pipeline(registry, app_state);
  query_pipeline::register_query_pipeline(registry, app_state);

  tracing::info!("All application flows registered.");
}
