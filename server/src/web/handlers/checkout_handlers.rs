// aquabulk/server/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{missing_result, run_flow};
use crate::errors::AppError;
use crate::pipelines::contexts::{CheckoutCtxData, PurchaseCtxData};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;

#[derive(Deserialize)]
pub struct BuyRequestPayload {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[instrument(
    name = "handler::buy",
    skip(app_state, req_payload, auth),
    fields(user_id = %auth.0.user_id, product_id = %req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn buy_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<BuyRequestPayload>,
  auth: AuthenticatedPrincipal,
) -> Result<HttpResponse, AppError> {
  let ctx_data = run_flow(
    app_state.get_ref(),
    PurchaseCtxData {
      app_state: app_state.get_ref().clone(),
      principal: auth.into_inner(),
      product_id: req_payload.product_id,
      quantity: req_payload.quantity,
      order: None,
    },
  )
  .await?;

  let order = ctx_data.read().order.clone().ok_or_else(|| missing_result("purchase", "order"))?;
  info!(order_id = %order.id, "Purchase successful.");
  Ok(HttpResponse::Created().json(json!({
    "message": "Purchase successful.",
    "order": order,
  })))
}

#[instrument(name = "handler::checkout", skip(app_state, auth), fields(user_id = %auth.0.user_id))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
) -> Result<HttpResponse, AppError> {
  let ctx_data = run_flow(
    app_state.get_ref(),
    CheckoutCtxData {
      app_state: app_state.get_ref().clone(),
      principal: auth.into_inner(),
      receipt: None,
    },
  )
  .await?;

  let receipt = ctx_data.write().receipt.take().ok_or_else(|| missing_result("checkout", "receipt"))?;
  info!(orders = receipt.orders.len(), total = %receipt.total, "Checkout successful.");
  Ok(HttpResponse::Ok().json(json!({
    "message": "Checkout successful.",
    "orders": receipt.orders,
    "total": receipt.total,
  })))
}
