// aquabulk/server/src/pipelines/checkout_pipeline.rs
use crate::errors::AppError;
use crate::pipelines::common_steps::{self, AUTHORIZE};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::state::AppState;
use aquabulk::{Flow, FlowContext, FlowRegistry, StepControl};
use std::sync::Arc;
use tracing::info;

pub fn register_checkout_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut p = Flow::<CheckoutCtxData, AppError>::new(&[(AUTHORIZE, false, None), ("checkout_cart", false, None)]);

  p.on_root(AUTHORIZE, common_steps::authorize_step::<CheckoutCtxData>);

  // One unit of work for the whole cart; see `TransactionEngine::checkout`.
  p.on_root("checkout_cart", |ctx_data: FlowContext<CheckoutCtxData>| {
    Box::pin(async move {
      let (engine, buyer_id) = {
        let guard = ctx_data.read();
        (guard.app_state.market.engine.clone(), guard.principal.user_id)
      };

      let receipt = engine.checkout(buyer_id).await?;
      info!(orders = receipt.orders.len(), total = %receipt.total, "Checkout flow completed.");
      ctx_data.write().receipt = Some(receipt);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  registry.register_flow(p);
}
