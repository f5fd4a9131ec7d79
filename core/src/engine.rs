// aquabulk/core/src/engine.rs

//! The transaction engine: the only path that moves quantity out of the
//! inventory ledger and into the order log.
//!
//! Every purchase and checkout runs inside one unit of work. Reservations
//! take the listing's row lock, so concurrent buyers of the same listing are
//! serialized by lock acquisition and each sees the quantity left by the one
//! before. Nothing is visible to anyone until the unit commits, and any
//! failure rolls the whole unit back.

use crate::error::{MarketError, MarketResult};
use crate::inventory::{validate_quantity, InventoryLedger};
use crate::model::Order;
use crate::orders::OrderLedger;
use crate::store::{MarketStore, UnitOfWork};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Result of a successful checkout: one order per cart line, in cart order.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
  pub orders: Vec<Order>,
  pub total: Decimal,
}

#[derive(Clone)]
pub struct TransactionEngine {
  store: Arc<dyn MarketStore>,
  inventory: InventoryLedger,
  orders: OrderLedger,
}

impl TransactionEngine {
  pub fn new(store: Arc<dyn MarketStore>) -> Self {
    Self {
      inventory: InventoryLedger::new(Arc::clone(&store)),
      orders: OrderLedger::new(Arc::clone(&store)),
      store,
    }
  }

  /// Buys `quantity` units of one listing.
  ///
  /// Validation and the existence check run before any lock is taken. The
  /// order is returned only after the unit has committed.
  #[instrument(name = "TransactionEngine::purchase", skip(self), fields(%buyer_id, %product_id), err(Display))]
  pub async fn purchase(&self, buyer_id: Uuid, product_id: Uuid, quantity: i32) -> MarketResult<Order> {
    validate_quantity(quantity)?;
    if self.inventory.get(product_id).await?.is_none() {
      return Err(MarketError::NotFound(format!("Product {} not found.", product_id)));
    }

    let mut unit = self.begin("purchase").await?;
    let result: MarketResult<Order> = async {
      let reservation = self.inventory.reserve(unit.as_mut(), product_id, quantity).await?;
      self.orders.append(unit.as_mut(), reservation.into_order(buyer_id)).await
    }
    .await;

    let order = self.finish(unit, "purchase", result).await?;
    info!(order_id = %order.id, total = %order.total_price, "Purchase committed.");
    Ok(order)
  }

  /// Converts the whole cart into orders, or nothing at all.
  ///
  /// Cart lines are read inside the unit in product-id order, which is also
  /// the order listing locks are taken in, so two checkouts over overlapping
  /// products cannot deadlock. Only the lines that were read are removed.
  #[instrument(name = "TransactionEngine::checkout", skip(self), fields(%buyer_id), err(Display))]
  pub async fn checkout(&self, buyer_id: Uuid) -> MarketResult<CheckoutReceipt> {
    let mut unit = self.begin("checkout").await?;
    let result: MarketResult<Vec<Order>> = async {
      let lines = unit.lock_cart_lines(buyer_id).await?;
      if lines.is_empty() {
        return Err(MarketError::EmptyCart);
      }

      let mut orders = Vec::with_capacity(lines.len());
      for line in &lines {
        let reservation = self
          .inventory
          .reserve(unit.as_mut(), line.product_id, line.quantity)
          .await?;
        orders.push(self.orders.append(unit.as_mut(), reservation.into_order(buyer_id)).await?);
      }
      unit.remove_cart_lines(buyer_id, &lines).await?;
      Ok(orders)
    }
    .await;

    let orders = self.finish(unit, "checkout", result).await?;
    let total: Decimal = orders.iter().map(|o| o.total_price).sum();
    info!(orders = orders.len(), %total, "Checkout committed.");
    Ok(CheckoutReceipt { orders, total })
  }

  async fn begin(&self, operation: &'static str) -> MarketResult<Box<dyn UnitOfWork>> {
    self.store.begin().await.map_err(|e| transaction_failed(operation, e))
  }

  /// Commits on success. On failure rolls back explicitly; expected outcomes
  /// pass through, anything else becomes `TransactionFailed`.
  async fn finish<T>(
    &self,
    unit: Box<dyn UnitOfWork>,
    operation: &'static str,
    result: MarketResult<T>,
  ) -> MarketResult<T> {
    match result {
      Ok(value) => {
        unit.commit().await.map_err(|e| transaction_failed(operation, e))?;
        Ok(value)
      }
      Err(err) => {
        if let Err(rollback_err) = unit.rollback().await {
          warn!(operation, error = %rollback_err, "Rollback failed; the unit is discarded.");
        }
        if err.is_expected_outcome() {
          info!(operation, reason = %err, "Unit rolled back.");
          Err(err)
        } else {
          Err(transaction_failed(operation, err))
        }
      }
    }
  }
}

fn transaction_failed(operation: &'static str, err: MarketError) -> MarketError {
  error!(operation, error = %err, detail = ?err, "Transaction failed and was rolled back.");
  MarketError::TransactionFailed {
    operation,
    source: Box::new(err),
  }
}
