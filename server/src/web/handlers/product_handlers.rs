// aquabulk/server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::{missing_result, run_flow, run_query};
use crate::errors::AppError;
use crate::pipelines::contexts::{MarketQuery, QueryResult, RestockCtxData};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;

#[derive(Deserialize)]
pub struct RestockRequestPayload {
  pub model_name: String,
  pub quantity: i32,
  pub unit_price: Decimal,
}

#[instrument(
    name = "handler::restock",
    skip(app_state, req_payload, auth),
    fields(user_id = %auth.0.user_id, model_name = %req_payload.model_name, quantity = req_payload.quantity)
)]
pub async fn restock_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RestockRequestPayload>,
  auth: AuthenticatedPrincipal,
) -> Result<HttpResponse, AppError> {
  let req = req_payload.into_inner();
  let ctx_data = run_flow(
    app_state.get_ref(),
    RestockCtxData {
      app_state: app_state.get_ref().clone(),
      principal: auth.into_inner(),
      model_name: req.model_name,
      unit_price: req.unit_price,
      quantity: req.quantity,
      listing: None,
    },
  )
  .await?;

  let listing = ctx_data
    .read()
    .listing
    .clone()
    .ok_or_else(|| missing_result("restock", "listing"))?;
  info!(listing_id = %listing.id, on_hand = listing.quantity, "Restock recorded.");
  Ok(HttpResponse::Created().json(json!({
    "message": "Inventory updated.",
    "product": listing,
  })))
}

#[instrument(name = "handler::seller_inventory", skip(app_state, auth), fields(user_id = %auth.0.user_id))]
pub async fn seller_inventory_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
) -> Result<HttpResponse, AppError> {
  match run_query(app_state.get_ref(), auth.into_inner(), MarketQuery::SellerInventory).await? {
    QueryResult::SellerInventory(listings) => Ok(HttpResponse::Ok().json(listings)),
    other => Err(AppError::Internal(format!("Unexpected query result: {:?}", other))),
  }
}

#[instrument(name = "handler::catalogue", skip(app_state, auth), fields(user_id = %auth.0.user_id))]
pub async fn catalogue_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
) -> Result<HttpResponse, AppError> {
  match run_query(app_state.get_ref(), auth.into_inner(), MarketQuery::Catalogue).await? {
    QueryResult::Catalogue(listings) => Ok(HttpResponse::Ok().json(listings)),
    other => Err(AppError::Internal(format!("Unexpected query result: {:?}", other))),
  }
}
