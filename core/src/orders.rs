// aquabulk/core/src/orders.rs

//! Append-only order log.

use crate::error::{MarketError, MarketResult};
use crate::model::{BuyerOrderView, NewOrder, Order, SellerOrderView};
use crate::store::{MarketStore, UnitOfWork};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct OrderLedger {
  store: Arc<dyn MarketStore>,
}

impl OrderLedger {
  pub fn new(store: Arc<dyn MarketStore>) -> Self {
    Self { store }
  }

  /// Records one order inside `unit`. Only the transaction engine appends.
  pub async fn append(&self, unit: &mut dyn UnitOfWork, order: NewOrder) -> MarketResult<Order> {
    if order.quantity <= 0 || order.total_price < Decimal::ZERO {
      return Err(MarketError::Invariant(format!(
        "refusing order with quantity {} and total {}",
        order.quantity, order.total_price
      )));
    }
    let order = unit.insert_order(order).await?;
    tracing::debug!(order_id = %order.id, total = %order.total_price, "Order staged.");
    Ok(order)
  }

  pub async fn list_for_buyer(&self, buyer_id: Uuid) -> MarketResult<Vec<BuyerOrderView>> {
    self.store.buyer_orders(buyer_id).await
  }

  pub async fn list_for_seller(&self, seller_id: Uuid) -> MarketResult<Vec<SellerOrderView>> {
    self.store.seller_orders(seller_id).await
  }

  pub async fn total_revenue(&self, seller_id: Uuid) -> MarketResult<Decimal> {
    self.store.seller_revenue(seller_id).await
  }
}
