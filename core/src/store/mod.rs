// aquabulk/core/src/store/mod.rs

//! Storage handles injected into the ledgers and the transaction engine.
//!
//! `MarketStore` covers the plain reads and writes that need no atomic unit
//! (restock upsert, cart CRUD, history queries, users). `UnitOfWork` is one
//! open atomic unit: row locks taken through it are held until `commit` or
//! `rollback`, and none of its writes are visible to anyone before `commit`.
//! Dropping a unit without committing discards it.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::error::MarketResult;
use crate::model::{
  AvailableListing, BuyerOrderView, CartLine, CartLineView, Listing, NewOrder, NewUser, Order, Restock,
  SellerOrderView, User,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use uuid::Uuid;

/// Default bound on how long a reservation waits for a listing's row lock.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait MarketStore: Send + Sync {
  /// Opens an atomic unit of work.
  async fn begin(&self) -> MarketResult<Box<dyn UnitOfWork>>;

  // --- users ---
  async fn insert_user(&self, new_user: NewUser) -> MarketResult<User>;
  async fn find_user_by_username(&self, username: &str) -> MarketResult<Option<User>>;

  // --- listings ---
  /// Adds `restock.quantity` to the listing with the same natural key, or
  /// creates it.
  async fn upsert_listing(&self, restock: &Restock) -> MarketResult<Listing>;
  async fn find_listing(&self, listing_id: Uuid) -> MarketResult<Option<Listing>>;
  /// All listings with seller names, newest first.
  async fn available_listings(&self) -> MarketResult<Vec<AvailableListing>>;
  async fn seller_listings(&self, seller_id: Uuid) -> MarketResult<Vec<Listing>>;

  // --- cart ---
  /// Inserts the line or adds `quantity` to the existing one.
  async fn upsert_cart_line(&self, buyer_id: Uuid, product_id: Uuid, quantity: i32) -> MarketResult<CartLine>;
  async fn cart_view(&self, buyer_id: Uuid) -> MarketResult<Vec<CartLineView>>;
  async fn delete_cart(&self, buyer_id: Uuid) -> MarketResult<u64>;

  // --- orders (read side) ---
  async fn buyer_orders(&self, buyer_id: Uuid) -> MarketResult<Vec<BuyerOrderView>>;
  async fn seller_orders(&self, seller_id: Uuid) -> MarketResult<Vec<SellerOrderView>>;
  /// Sum of order totals; zero for a seller without orders.
  async fn seller_revenue(&self, seller_id: Uuid) -> MarketResult<Decimal>;
}

#[async_trait]
pub trait UnitOfWork: Send {
  /// Reads the buyer's cart lines, ordered by product id, locking them
  /// against concurrent modification for the rest of the unit.
  async fn lock_cart_lines(&mut self, buyer_id: Uuid) -> MarketResult<Vec<CartLine>>;

  /// Takes the exclusive row lock on a listing (waiting at most the store's
  /// lock bound) and returns its state as seen by this unit.
  /// `None` if the listing does not exist.
  async fn lock_listing(&mut self, listing_id: Uuid) -> MarketResult<Option<Listing>>;

  /// Decrements a listing this unit has locked. Never drives quantity below zero.
  async fn decrement_listing(&mut self, listing_id: Uuid, quantity: i32) -> MarketResult<Listing>;

  async fn insert_order(&mut self, order: NewOrder) -> MarketResult<Order>;

  /// Deletes exactly the given lines (as previously returned by `lock_cart_lines`).
  async fn remove_cart_lines(&mut self, buyer_id: Uuid, lines: &[CartLine]) -> MarketResult<u64>;

  async fn commit(self: Box<Self>) -> MarketResult<()>;
  async fn rollback(self: Box<Self>) -> MarketResult<()>;
}
