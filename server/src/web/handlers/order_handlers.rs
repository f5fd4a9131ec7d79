// aquabulk/server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use super::run_query;
use crate::errors::AppError;
use crate::pipelines::contexts::{MarketQuery, QueryResult};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;

#[instrument(name = "handler::buyer_orders", skip(app_state, auth), fields(user_id = %auth.0.user_id))]
pub async fn buyer_orders_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
) -> Result<HttpResponse, AppError> {
  match run_query(app_state.get_ref(), auth.into_inner(), MarketQuery::BuyerOrders).await? {
    QueryResult::BuyerOrders(orders) => Ok(HttpResponse::Ok().json(orders)),
    other => Err(AppError::Internal(format!("Unexpected query result: {:?}", other))),
  }
}

#[instrument(name = "handler::seller_orders", skip(app_state, auth), fields(user_id = %auth.0.user_id))]
pub async fn seller_orders_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
) -> Result<HttpResponse, AppError> {
  match run_query(app_state.get_ref(), auth.into_inner(), MarketQuery::SellerOrders).await? {
    QueryResult::SellerOrders { orders, total_revenue } => Ok(HttpResponse::Ok().json(json!({
      "orders": orders,
      "totalRevenue": total_revenue,
    }))),
    other => Err(AppError::Internal(format!("Unexpected query result: {:?}", other))),
  }
}
