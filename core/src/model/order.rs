// aquabulk/core/src/model/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// An immutable record of one committed purchase.
///
/// `total_price` is the reserved listing's unit price times `quantity`, fixed
/// at reservation time. Orders are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub buyer_id: Uuid,
  pub seller_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub total_price: Decimal,
  pub ordered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
  pub buyer_id: Uuid,
  pub seller_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub total_price: Decimal,
}

/// Buyer's order history row (counterparty is the seller).
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct BuyerOrderView {
  pub id: Uuid,
  pub product_id: Uuid,
  pub model_name: String,
  pub quantity: i32,
  pub total_price: Decimal,
  pub ordered_at: DateTime<Utc>,
  pub seller_id: Uuid,
  pub seller_name: String,
}

/// Seller's order history row (counterparty is the buyer).
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SellerOrderView {
  pub id: Uuid,
  pub product_id: Uuid,
  pub model_name: String,
  pub quantity: i32,
  pub total_price: Decimal,
  pub ordered_at: DateTime<Utc>,
  pub buyer_id: Uuid,
  pub buyer_name: String,
}
