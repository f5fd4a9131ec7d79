// aquabulk/server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{missing_result, run_flow, run_query};
use crate::errors::AppError;
use crate::pipelines::contexts::{AddToCartCtxData, ClearCartCtxData, MarketQuery, QueryResult};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;

#[derive(Deserialize)]
pub struct AddToCartRequestPayload {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, req_payload, auth),
    fields(user_id = %auth.0.user_id, product_id = %req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AddToCartRequestPayload>,
  auth: AuthenticatedPrincipal,
) -> Result<HttpResponse, AppError> {
  let ctx_data = run_flow(
    app_state.get_ref(),
    AddToCartCtxData {
      app_state: app_state.get_ref().clone(),
      principal: auth.into_inner(),
      product_id: req_payload.product_id,
      quantity: req_payload.quantity,
      updated_line: None,
    },
  )
  .await?;

  let line = ctx_data
    .read()
    .updated_line
    .clone()
    .ok_or_else(|| missing_result("add_to_cart", "updated_line"))?;
  info!(quantity = line.quantity, "Cart line updated.");
  Ok(HttpResponse::Ok().json(json!({
    "message": "Product added to cart.",
    "item": line,
  })))
}

/// The cart with live prices; `total` is what checkout would charge right now.
#[instrument(name = "handler::view_cart", skip(app_state, auth), fields(user_id = %auth.0.user_id))]
pub async fn view_cart_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
) -> Result<HttpResponse, AppError> {
  match run_query(app_state.get_ref(), auth.into_inner(), MarketQuery::BuyerCart).await? {
    QueryResult::BuyerCart(items) => {
      let total: Decimal = items.iter().map(|i| i.line_total).sum();
      Ok(HttpResponse::Ok().json(json!({ "items": items, "total": total })))
    }
    other => Err(AppError::Internal(format!("Unexpected query result: {:?}", other))),
  }
}

#[instrument(name = "handler::clear_cart", skip(app_state, auth), fields(user_id = %auth.0.user_id))]
pub async fn clear_cart_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
) -> Result<HttpResponse, AppError> {
  let ctx_data = run_flow(
    app_state.get_ref(),
    ClearCartCtxData {
      app_state: app_state.get_ref().clone(),
      principal: auth.into_inner(),
      removed: 0,
    },
  )
  .await?;

  let removed = ctx_data.read().removed;
  Ok(HttpResponse::Ok().json(json!({
    "message": "Cart cleared.",
    "removed": removed,
  })))
}
