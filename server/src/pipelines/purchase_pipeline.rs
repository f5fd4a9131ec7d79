// aquabulk/server/src/pipelines/purchase_pipeline.rs
use crate::errors::AppError;
use crate::pipelines::common_steps::{self, AUTHORIZE};
use crate::pipelines::contexts::PurchaseCtxData;
use crate::state::AppState;
use aquabulk::{Flow, FlowContext, FlowRegistry, StepControl};
use std::sync::Arc;
use tracing::info;

pub fn register_purchase_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut p = Flow::<PurchaseCtxData, AppError>::new(&[(AUTHORIZE, false, None), ("purchase_listing", false, None)]);

  p.on_root(AUTHORIZE, common_steps::authorize_step::<PurchaseCtxData>);

  p.on_root("purchase_listing", |ctx_data: FlowContext<PurchaseCtxData>| {
    Box::pin(async move {
      let (engine, buyer_id, product_id, quantity) = {
        let guard = ctx_data.read();
        (
          guard.app_state.market.engine.clone(),
          guard.principal.user_id,
          guard.product_id,
          guard.quantity,
        )
      };

      let order = engine.purchase(buyer_id, product_id, quantity).await?;
      info!(order_id = %order.id, "Purchase flow recorded order.");
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  registry.register_flow(p);
}
