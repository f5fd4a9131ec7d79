// aquabulk/core/src/model/listing.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A seller's sellable quantity of one model at one unit price.
///
/// `(seller_id, model_name, unit_price)` is the natural key restocks merge on;
/// the same model at a different price is a different listing.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Listing {
  pub id: Uuid,
  pub seller_id: Uuid,
  pub model_name: String,
  pub unit_price: Decimal,
  pub quantity: i32,
  pub created_at: DateTime<Utc>,
}

/// Catalogue row: a listing joined with its seller's display name.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct AvailableListing {
  pub id: Uuid,
  pub seller_id: Uuid,
  pub seller_name: String,
  pub model_name: String,
  pub unit_price: Decimal,
  pub quantity: i32,
  pub created_at: DateTime<Utc>,
}

/// A validated restock request, ready for the store's upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct Restock {
  pub seller_id: Uuid,
  pub model_name: String,
  pub unit_price: Decimal,
  pub quantity: i32,
}
