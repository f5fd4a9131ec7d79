// aquabulk/core/src/cart.rs

//! Per-buyer carts, mutated independently of inventory until checkout.

use crate::error::{MarketError, MarketResult};
use crate::inventory::validate_quantity;
use crate::model::{CartLine, CartLineView};
use crate::store::MarketStore;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct CartStore {
  store: Arc<dyn MarketStore>,
}

impl CartStore {
  pub fn new(store: Arc<dyn MarketStore>) -> Self {
    Self { store }
  }

  /// Adds `quantity` of a product, summing with any existing line.
  /// Stock is not checked here; checkout does that under lock.
  #[instrument(name = "CartStore::add", skip(self), err(Display))]
  pub async fn add(&self, buyer_id: Uuid, product_id: Uuid, quantity: i32) -> MarketResult<CartLine> {
    validate_quantity(quantity)?;
    if self.store.find_listing(product_id).await?.is_none() {
      return Err(MarketError::NotFound(format!("Product {} not found.", product_id)));
    }
    let line = self.store.upsert_cart_line(buyer_id, product_id, quantity).await?;
    info!(cart_quantity = line.quantity, "Cart line updated.");
    Ok(line)
  }

  /// Current lines priced at the listings' present prices.
  pub async fn list(&self, buyer_id: Uuid) -> MarketResult<Vec<CartLineView>> {
    self.store.cart_view(buyer_id).await
  }

  /// Removes every line; clearing an empty cart is not an error.
  #[instrument(name = "CartStore::clear", skip(self), err(Display))]
  pub async fn clear(&self, buyer_id: Uuid) -> MarketResult<u64> {
    let removed = self.store.delete_cart(buyer_id).await?;
    info!(removed, "Cart cleared.");
    Ok(removed)
  }
}
