// aquabulk/server/src/pipelines/cart_pipeline.rs
use crate::errors::AppError;
use crate::pipelines::common_steps::{self, AUTHORIZE};
use crate::pipelines::contexts::{AddToCartCtxData, ClearCartCtxData};
use crate::state::AppState;
use aquabulk::{Flow, FlowContext, FlowRegistry, StepControl};
use std::sync::Arc;

pub fn register_add_to_cart_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut p = Flow::<AddToCartCtxData, AppError>::new(&[(AUTHORIZE, false, None), ("add_cart_line", false, None)]);

  p.on_root(AUTHORIZE, common_steps::authorize_step::<AddToCartCtxData>);

  p.on_root("add_cart_line", |ctx_data: FlowContext<AddToCartCtxData>| {
    Box::pin(async move {
      let (cart, buyer_id, product_id, quantity) = {
        let guard = ctx_data.read();
        (
          guard.app_state.market.cart.clone(),
          guard.principal.user_id,
          guard.product_id,
          guard.quantity,
        )
      };
      let line = cart.add(buyer_id, product_id, quantity).await?;
      ctx_data.write().updated_line = Some(line);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  registry.register_flow(p);
}

pub fn register_clear_cart_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut p = Flow::<ClearCartCtxData, AppError>::new(&[(AUTHORIZE, false, None), ("clear_cart", false, None)]);

  p.on_root(AUTHORIZE, common_steps::authorize_step::<ClearCartCtxData>);

  p.on_root("clear_cart", |ctx_data: FlowContext<ClearCartCtxData>| {
    Box::pin(async move {
      let (cart, buyer_id) = {
        let guard = ctx_data.read();
        (guard.app_state.market.cart.clone(), guard.principal.user_id)
      };
      let removed = cart.clear(buyer_id).await?;
      ctx_data.write().removed = removed;
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  registry.register_flow(p);
}
