// aquabulk/server/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod cart_handlers;
pub mod checkout_handlers;
pub mod order_handlers;
pub mod product_handlers;

use crate::errors::AppError;
use crate::pipelines::contexts::{MarketQuery, QueryCtxData, QueryResult};
use crate::state::AppState;
use aquabulk::{FlowContext, FlowOutcome, Principal};
use tracing::warn;

/// Runs the flow registered for `T` and hands back its context once it has
/// completed. A flow that stops early has no result to report.
pub(crate) async fn run_flow<T>(app_state: &AppState, initial: T) -> Result<FlowContext<T>, AppError>
where
  T: Send + Sync + 'static,
{
  let ctx_data = FlowContext::new(initial);
  match app_state.flows.run(ctx_data.clone()).await? {
    FlowOutcome::Completed => Ok(ctx_data),
    FlowOutcome::Stopped => {
      warn!(context_type = %std::any::type_name::<T>(), "Flow was stopped by a handler.");
      Err(AppError::PipelineHaltedByHandler)
    }
  }
}

/// Runs a read-only view for `principal`.
pub(crate) async fn run_query(
  app_state: &AppState,
  principal: Principal,
  query: MarketQuery,
) -> Result<QueryResult, AppError> {
  let ctx_data = run_flow(
    app_state,
    QueryCtxData {
      app_state: app_state.clone(),
      principal,
      query,
      result: None,
    },
  )
  .await?;
  let result = ctx_data.write().result.take();
  result.ok_or_else(|| AppError::Internal(format!("Query {:?} completed without a result.", query)))
}

/// Builds the error for a flow that completed without setting `field`.
pub(crate) fn missing_result(flow: &str, field: &str) -> AppError {
  warn!(flow, field, "Flow completed but its result was not set.");
  AppError::Internal(format!("{} completed without {}.", flow, field))
}
