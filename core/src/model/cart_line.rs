// aquabulk/core/src/model/cart_line.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One product in a buyer's cart. `(buyer_id, product_id)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CartLine {
  pub buyer_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

/// A cart line joined with the live state of its listing (not a snapshot).
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CartLineView {
  pub product_id: Uuid,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub line_total: Decimal,
  pub model_name: String,
  pub seller_id: Uuid,
  pub seller_name: String,
  pub added_at: DateTime<Utc>,
}
