// aquabulk/core/src/inventory.rs

//! Inventory ledger: sellable quantity and unit price per listing.

use crate::error::{MarketError, MarketResult};
use crate::model::{AvailableListing, Listing, NewOrder, Restock};
use crate::store::{MarketStore, UnitOfWork};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Exclusive upper bound on unit prices (`NUMERIC(12, 2)`).
const MAX_UNIT_PRICE: i64 = 10_000_000_000;

/// Quantity taken out of a listing inside an open unit of work, with the
/// price that was locked at the time.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
  pub listing_id: Uuid,
  pub seller_id: Uuid,
  pub unit_price: Decimal,
  pub quantity: i32,
  /// Listing quantity after the decrement, as seen by the unit.
  pub remaining: i32,
}

impl Reservation {
  pub fn total_price(&self) -> Decimal {
    self.unit_price * Decimal::from(self.quantity)
  }

  pub fn into_order(self, buyer_id: Uuid) -> NewOrder {
    NewOrder {
      buyer_id,
      seller_id: self.seller_id,
      product_id: self.listing_id,
      quantity: self.quantity,
      total_price: self.total_price(),
    }
  }
}

pub(crate) fn validate_quantity(quantity: i32) -> MarketResult<()> {
  if quantity <= 0 {
    return Err(MarketError::Validation("Quantity must be a positive integer.".to_string()));
  }
  Ok(())
}

fn validate_price(unit_price: Decimal) -> MarketResult<Decimal> {
  if unit_price <= Decimal::ZERO {
    return Err(MarketError::Validation("Unit price must be positive.".to_string()));
  }
  if unit_price.normalize().scale() > 2 {
    return Err(MarketError::Validation(
      "Unit price may have at most two decimal places.".to_string(),
    ));
  }
  if unit_price >= Decimal::from(MAX_UNIT_PRICE) {
    return Err(MarketError::Validation("Unit price is too large.".to_string()));
  }
  Ok(unit_price.round_dp(2))
}

#[derive(Clone)]
pub struct InventoryLedger {
  store: Arc<dyn MarketStore>,
}

impl InventoryLedger {
  pub fn new(store: Arc<dyn MarketStore>) -> Self {
    Self { store }
  }

  /// Adds `quantity` to the `(seller, model_name, unit_price)` listing,
  /// creating it on first restock.
  #[instrument(name = "InventoryLedger::restock", skip(self, model_name), fields(%seller_id, %unit_price, quantity), err(Display))]
  pub async fn restock(
    &self,
    seller_id: Uuid,
    model_name: &str,
    unit_price: Decimal,
    quantity: i32,
  ) -> MarketResult<Listing> {
    let model_name = model_name.trim();
    if model_name.is_empty() {
      return Err(MarketError::Validation("Model name is required.".to_string()));
    }
    validate_quantity(quantity)?;
    let unit_price = validate_price(unit_price)?;

    let listing = self
      .store
      .upsert_listing(&Restock {
        seller_id,
        model_name: model_name.to_string(),
        unit_price,
        quantity,
      })
      .await?;
    info!(listing_id = %listing.id, on_hand = listing.quantity, "Restocked listing.");
    Ok(listing)
  }

  /// Locks the listing for the rest of `unit`, checks the requested quantity
  /// against what is on hand, and decrements it inside the unit.
  ///
  /// Only the transaction engine calls this. The decrement becomes durable
  /// when the unit commits.
  #[instrument(name = "InventoryLedger::reserve", skip(self, unit), fields(%listing_id, quantity), err(Display))]
  pub async fn reserve(
    &self,
    unit: &mut dyn UnitOfWork,
    listing_id: Uuid,
    quantity: i32,
  ) -> MarketResult<Reservation> {
    validate_quantity(quantity)?;
    let listing = unit
      .lock_listing(listing_id)
      .await?
      .ok_or_else(|| MarketError::NotFound(format!("Product {} not found.", listing_id)))?;

    if quantity > listing.quantity {
      debug!(available = listing.quantity, "Reservation refused.");
      return Err(MarketError::InsufficientStock {
        product_id: listing_id,
        requested: quantity,
        available: listing.quantity,
      });
    }

    let updated = unit.decrement_listing(listing_id, quantity).await?;
    Ok(Reservation {
      listing_id,
      seller_id: listing.seller_id,
      unit_price: listing.unit_price,
      quantity,
      remaining: updated.quantity,
    })
  }

  /// Every listing with its seller's name, most recently created first.
  pub async fn list_available(&self) -> MarketResult<Vec<AvailableListing>> {
    self.store.available_listings().await
  }

  pub async fn list_for_seller(&self, seller_id: Uuid) -> MarketResult<Vec<Listing>> {
    self.store.seller_listings(seller_id).await
  }

  pub async fn get(&self, listing_id: Uuid) -> MarketResult<Option<Listing>> {
    self.store.find_listing(listing_id).await
  }
}
