// aquabulk/server/src/pipelines/restock_pipeline.rs
use crate::errors::AppError;
use crate::pipelines::common_steps::{self, AUTHORIZE};
use crate::pipelines::contexts::RestockCtxData;
use crate::state::AppState;
use aquabulk::{Flow, FlowContext, FlowRegistry, StepControl};
use std::sync::Arc;

pub fn register_restock_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut p = Flow::<RestockCtxData, AppError>::new(&[(AUTHORIZE, false, None), ("restock_listing", false, None)]);

  p.on_root(AUTHORIZE, common_steps::authorize_step::<RestockCtxData>);

  p.on_root("restock_listing", |ctx_data: FlowContext<RestockCtxData>| {
    Box::pin(async move {
      let (inventory, seller_id, model_name, unit_price, quantity) = {
        let guard = ctx_data.read();
        (
          guard.app_state.market.inventory.clone(),
          guard.principal.user_id,
          guard.model_name.clone(),
          guard.unit_price,
          guard.quantity,
        )
      };
      let listing = inventory.restock(seller_id, &model_name, unit_price, quantity).await?;
      ctx_data.write().listing = Some(listing);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  registry.register_flow(p);
}
