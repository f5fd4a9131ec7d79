// aquabulk/server/src/pipelines/query_pipeline.rs

//! Read-only views. They take no locks and pass straight through to the
//! ledgers once the capability check has run.

use crate::errors::AppError;
use crate::pipelines::common_steps::{self, AUTHORIZE};
use crate::pipelines::contexts::{MarketQuery, QueryCtxData, QueryResult};
use crate::state::AppState;
use aquabulk::{Flow, FlowContext, FlowRegistry, StepControl};
use std::sync::Arc;

pub fn register_query_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut p = Flow::<QueryCtxData, AppError>::new(&[(AUTHORIZE, false, None), ("run_query", false, None)]);

  p.on_root(AUTHORIZE, common_steps::authorize_step::<QueryCtxData>);

  p.on_root("run_query", |ctx_data: FlowContext<QueryCtxData>| {
    Box::pin(async move {
      let (market, user_id, query) = {
        let guard = ctx_data.read();
        (guard.app_state.market.clone(), guard.principal.user_id, guard.query)
      };

      let result = match query {
        MarketQuery::Catalogue => QueryResult::Catalogue(market.inventory.list_available().await?),
        MarketQuery::BuyerCart => QueryResult::BuyerCart(market.cart.list(user_id).await?),
        MarketQuery::BuyerOrders => QueryResult::BuyerOrders(market.orders.list_for_buyer(user_id).await?),
        MarketQuery::SellerInventory => QueryResult::SellerInventory(market.inventory.list_for_seller(user_id).await?),
        MarketQuery::SellerOrders => QueryResult::SellerOrders {
          orders: market.orders.list_for_seller(user_id).await?,
          total_revenue: market.orders.total_revenue(user_id).await?,
        },
      };
      ctx_data.write().result = Some(result);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  registry.register_flow(p);
}
