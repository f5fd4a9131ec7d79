// aquabulk/core/src/store/memory.rs

//! In-process store used by tests and `STORE_BACKEND=memory` runs.
//!
//! Row locks are per-listing `tokio` mutexes, held by a unit of work from
//! `lock_listing` until the unit commits, rolls back or is dropped. Each
//! buyer's cart has one more such mutex: a unit holds it from
//! `lock_cart_lines` onwards, and plain cart writes wait for it. A unit stages
//! its decrements, orders and cart removals and applies them under one write
//! lock at commit, so other readers never observe a partial unit.

use crate::error::{MarketError, MarketResult};
use crate::model::{
  AvailableListing, BuyerOrderView, CartLine, CartLineView, Listing, NewOrder, NewUser, Order, Restock,
  SellerOrderView, User,
};
use crate::store::{MarketStore, UnitOfWork, DEFAULT_LOCK_WAIT};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

struct StoredListing {
  listing: Listing,
  // Insertion order; breaks ties between equal `created_at` values.
  seq: u64,
}

#[derive(Default)]
struct MemoryState {
  users: HashMap<Uuid, User>,
  listings: HashMap<Uuid, StoredListing>,
  // Keyed by (buyer_id, product_id), so one buyer's lines are contiguous and
  // ordered by product id.
  cart: BTreeMap<(Uuid, Uuid), CartLine>,
  // Append-only, in commit order.
  orders: Vec<Order>,
  next_seq: u64,
}

impl MemoryState {
  fn username(&self, user_id: &Uuid) -> Option<String> {
    self.users.get(user_id).map(|u| u.username.clone())
  }
}

type LockMap = Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>;

struct Shared {
  state: RwLock<MemoryState>,
  // Keyed by listing id.
  row_locks: LockMap,
  // Keyed by buyer id.
  cart_locks: LockMap,
  lock_wait: Duration,
}

fn lock_entry(locks: &LockMap, key: Uuid) -> Arc<AsyncMutex<()>> {
  locks
    .lock()
    .entry(key)
    .or_insert_with(|| Arc::new(AsyncMutex::new(())))
    .clone()
}

impl Shared {
  async fn lock_row(&self, listing_id: Uuid) -> MarketResult<OwnedMutexGuard<()>> {
    let row_lock = lock_entry(&self.row_locks, listing_id);
    tokio::time::timeout(self.lock_wait, row_lock.lock_owned())
      .await
      .map_err(|_elapsed| {
        warn!(%listing_id, wait = ?self.lock_wait, "Row lock wait exceeded.");
        MarketError::LockTimeout { product_id: listing_id }
      })
  }

  async fn lock_cart(&self, buyer_id: Uuid) -> MarketResult<OwnedMutexGuard<()>> {
    let cart_lock = lock_entry(&self.cart_locks, buyer_id);
    tokio::time::timeout(self.lock_wait, cart_lock.lock_owned())
      .await
      .map_err(|_elapsed| {
        warn!(%buyer_id, wait = ?self.lock_wait, "Cart lock wait exceeded.");
        MarketError::CartLockTimeout { buyer_id }
      })
  }
}

/// Cheaply cloneable handle; clones share the same data.
#[derive(Clone)]
pub struct MemoryStore {
  shared: Arc<Shared>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::with_lock_wait(DEFAULT_LOCK_WAIT)
  }

  pub fn with_lock_wait(lock_wait: Duration) -> Self {
    Self {
      shared: Arc::new(Shared {
        state: RwLock::new(MemoryState::default()),
        row_locks: Mutex::new(HashMap::new()),
        cart_locks: Mutex::new(HashMap::new()),
        lock_wait,
      }),
    }
  }

  pub fn lock_wait(&self) -> Duration {
    self.shared.lock_wait
  }
}

impl Default for MemoryStore {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for MemoryStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MemoryStore")
      .field("lock_wait", &self.shared.lock_wait)
      .finish_non_exhaustive()
  }
}

fn newest_first(a: &StoredListing, b: &StoredListing) -> std::cmp::Ordering {
  b.listing
    .created_at
    .cmp(&a.listing.created_at)
    .then(b.seq.cmp(&a.seq))
}

#[async_trait]
impl MarketStore for MemoryStore {
  async fn begin(&self) -> MarketResult<Box<dyn UnitOfWork>> {
    Ok(Box::new(MemoryUnit {
      shared: Arc::clone(&self.shared),
      held: HashMap::new(),
      carts_held: HashMap::new(),
      decrements: HashMap::new(),
      orders: Vec::new(),
      cart_removals: Vec::new(),
    }))
  }

  async fn insert_user(&self, new_user: NewUser) -> MarketResult<User> {
    let mut state = self.shared.state.write();
    if state.users.values().any(|u| u.username == new_user.username) {
      return Err(MarketError::Validation(format!(
        "Username '{}' is already registered.",
        new_user.username
      )));
    }
    let user = User {
      id: Uuid::new_v4(),
      username: new_user.username,
      password_hash: new_user.password_hash,
      role: new_user.role,
      created_at: Utc::now(),
    };
    state.users.insert(user.id, user.clone());
    Ok(user)
  }

  async fn find_user_by_username(&self, username: &str) -> MarketResult<Option<User>> {
    let state = self.shared.state.read();
    Ok(state.users.values().find(|u| u.username == username).cloned())
  }

  async fn upsert_listing(&self, restock: &Restock) -> MarketResult<Listing> {
    let mut state = self.shared.state.write();
    if !state.users.contains_key(&restock.seller_id) {
      return Err(MarketError::NotFound(format!("Seller {} not found.", restock.seller_id)));
    }

    let existing = state.listings.values_mut().find(|s| {
      s.listing.seller_id == restock.seller_id
        && s.listing.model_name == restock.model_name
        && s.listing.unit_price == restock.unit_price
    });
    if let Some(stored) = existing {
      stored.listing.quantity = stored
        .listing
        .quantity
        .checked_add(restock.quantity)
        .ok_or_else(|| MarketError::Validation("Restock would overflow the listing quantity.".to_string()))?;
      debug!(listing_id = %stored.listing.id, quantity = stored.listing.quantity, "Merged restock into existing listing.");
      return Ok(stored.listing.clone());
    }

    let seq = state.next_seq;
    state.next_seq += 1;
    let listing = Listing {
      id: Uuid::new_v4(),
      seller_id: restock.seller_id,
      model_name: restock.model_name.clone(),
      unit_price: restock.unit_price,
      quantity: restock.quantity,
      created_at: Utc::now(),
    };
    state.listings.insert(
      listing.id,
      StoredListing {
        listing: listing.clone(),
        seq,
      },
    );
    debug!(listing_id = %listing.id, "Created listing.");
    Ok(listing)
  }

  async fn find_listing(&self, listing_id: Uuid) -> MarketResult<Option<Listing>> {
    let state = self.shared.state.read();
    Ok(state.listings.get(&listing_id).map(|s| s.listing.clone()))
  }

  async fn available_listings(&self) -> MarketResult<Vec<AvailableListing>> {
    let state = self.shared.state.read();
    let mut stored: Vec<&StoredListing> = state.listings.values().collect();
    stored.sort_by(|a, b| newest_first(a, b));
    Ok(
      stored
        .into_iter()
        .filter_map(|s| {
          let l = &s.listing;
          state.username(&l.seller_id).map(|seller_name| AvailableListing {
            id: l.id,
            seller_id: l.seller_id,
            seller_name,
            model_name: l.model_name.clone(),
            unit_price: l.unit_price,
            quantity: l.quantity,
            created_at: l.created_at,
          })
        })
        .collect(),
    )
  }

  async fn seller_listings(&self, seller_id: Uuid) -> MarketResult<Vec<Listing>> {
    let state = self.shared.state.read();
    let mut stored: Vec<&StoredListing> = state
      .listings
      .values()
      .filter(|s| s.listing.seller_id == seller_id)
      .collect();
    stored.sort_by(|a, b| newest_first(a, b));
    Ok(stored.into_iter().map(|s| s.listing.clone()).collect())
  }

  async fn upsert_cart_line(&self, buyer_id: Uuid, product_id: Uuid, quantity: i32) -> MarketResult<CartLine> {
    let _cart_guard = self.shared.lock_cart(buyer_id).await?;
    let mut state = self.shared.state.write();
    if !state.users.contains_key(&buyer_id) {
      return Err(MarketError::NotFound(format!("Buyer {} not found.", buyer_id)));
    }
    if !state.listings.contains_key(&product_id) {
      return Err(MarketError::NotFound(format!("Product {} not found.", product_id)));
    }

    let line = state.cart.entry((buyer_id, product_id)).or_insert_with(|| CartLine {
      buyer_id,
      product_id,
      quantity: 0,
      added_at: Utc::now(),
    });
    line.quantity = line
      .quantity
      .checked_add(quantity)
      .ok_or_else(|| MarketError::Validation("Cart quantity would overflow.".to_string()))?;
    Ok(line.clone())
  }

  async fn cart_view(&self, buyer_id: Uuid) -> MarketResult<Vec<CartLineView>> {
    let state = self.shared.state.read();
    let mut lines: Vec<CartLineView> = state
      .cart
      .values()
      .filter(|c| c.buyer_id == buyer_id)
      .filter_map(|c| {
        let listing = &state.listings.get(&c.product_id)?.listing;
        let seller_name = state.username(&listing.seller_id)?;
        Some(CartLineView {
          product_id: c.product_id,
          quantity: c.quantity,
          unit_price: listing.unit_price,
          line_total: listing.unit_price * Decimal::from(c.quantity),
          model_name: listing.model_name.clone(),
          seller_id: listing.seller_id,
          seller_name,
          added_at: c.added_at,
        })
      })
      .collect();
    lines.sort_by(|a, b| a.added_at.cmp(&b.added_at).then(a.product_id.cmp(&b.product_id)));
    Ok(lines)
  }

  async fn delete_cart(&self, buyer_id: Uuid) -> MarketResult<u64> {
    let _cart_guard = self.shared.lock_cart(buyer_id).await?;
    let mut state = self.shared.state.write();
    let before = state.cart.len();
    state.cart.retain(|(buyer, _), _| *buyer != buyer_id);
    Ok((before - state.cart.len()) as u64)
  }

  async fn buyer_orders(&self, buyer_id: Uuid) -> MarketResult<Vec<BuyerOrderView>> {
    let state = self.shared.state.read();
    Ok(
      state
        .orders
        .iter()
        .rev()
        .filter(|o| o.buyer_id == buyer_id)
        .filter_map(|o| {
          Some(BuyerOrderView {
            id: o.id,
            product_id: o.product_id,
            model_name: state.listings.get(&o.product_id)?.listing.model_name.clone(),
            quantity: o.quantity,
            total_price: o.total_price,
            ordered_at: o.ordered_at,
            seller_id: o.seller_id,
            seller_name: state.username(&o.seller_id)?,
          })
        })
        .collect(),
    )
  }

  async fn seller_orders(&self, seller_id: Uuid) -> MarketResult<Vec<SellerOrderView>> {
    let state = self.shared.state.read();
    Ok(
      state
        .orders
        .iter()
        .rev()
        .filter(|o| o.seller_id == seller_id)
        .filter_map(|o| {
          Some(SellerOrderView {
            id: o.id,
            product_id: o.product_id,
            model_name: state.listings.get(&o.product_id)?.listing.model_name.clone(),
            quantity: o.quantity,
            total_price: o.total_price,
            ordered_at: o.ordered_at,
            buyer_id: o.buyer_id,
            buyer_name: state.username(&o.buyer_id)?,
          })
        })
        .collect(),
    )
  }

  async fn seller_revenue(&self, seller_id: Uuid) -> MarketResult<Decimal> {
    let state = self.shared.state.read();
    Ok(
      state
        .orders
        .iter()
        .filter(|o| o.seller_id == seller_id)
        .map(|o| o.total_price)
        .sum(),
    )
  }
}

/// One open unit of work against a `MemoryStore`.
struct MemoryUnit {
  shared: Arc<Shared>,
  // Row locks taken by this unit; released when the unit goes away.
  held: HashMap<Uuid, OwnedMutexGuard<()>>,
  // Cart locks, by buyer id.
  carts_held: HashMap<Uuid, OwnedMutexGuard<()>>,
  decrements: HashMap<Uuid, i32>,
  orders: Vec<Order>,
  cart_removals: Vec<CartLine>,
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
  async fn lock_cart_lines(&mut self, buyer_id: Uuid) -> MarketResult<Vec<CartLine>> {
    if !self.carts_held.contains_key(&buyer_id) {
      let guard = self.shared.lock_cart(buyer_id).await?;
      self.carts_held.insert(buyer_id, guard);
    }
    let state = self.shared.state.read();
    Ok(
      state
        .cart
        .values()
        .filter(|c| c.buyer_id == buyer_id)
        .cloned()
        .collect(),
    )
  }

  async fn lock_listing(&mut self, listing_id: Uuid) -> MarketResult<Option<Listing>> {
    if !self.held.contains_key(&listing_id) {
      let guard = self.shared.lock_row(listing_id).await?;
      self.held.insert(listing_id, guard);
    }

    let state = self.shared.state.read();
    match state.listings.get(&listing_id) {
      Some(stored) => {
        let mut listing = stored.listing.clone();
        listing.quantity -= self.decrements.get(&listing_id).copied().unwrap_or(0);
        Ok(Some(listing))
      }
      None => {
        drop(state);
        self.held.remove(&listing_id);
        Ok(None)
      }
    }
  }

  async fn decrement_listing(&mut self, listing_id: Uuid, quantity: i32) -> MarketResult<Listing> {
    if !self.held.contains_key(&listing_id) {
      return Err(MarketError::Invariant(format!(
        "decrement of listing {} without holding its row lock",
        listing_id
      )));
    }
    let state = self.shared.state.read();
    let stored = state
      .listings
      .get(&listing_id)
      .ok_or_else(|| MarketError::NotFound(format!("Product {} not found.", listing_id)))?;

    let already = self.decrements.get(&listing_id).copied().unwrap_or(0);
    let remaining = stored.listing.quantity - already - quantity;
    if quantity <= 0 || remaining < 0 {
      return Err(MarketError::Invariant(format!(
        "decrement of listing {} by {} would leave {}",
        listing_id, quantity, remaining
      )));
    }
    let mut listing = stored.listing.clone();
    listing.quantity = remaining;
    drop(state);

    self.decrements.insert(listing_id, already + quantity);
    Ok(listing)
  }

  async fn insert_order(&mut self, order: NewOrder) -> MarketResult<Order> {
    let order = Order {
      id: Uuid::new_v4(),
      buyer_id: order.buyer_id,
      seller_id: order.seller_id,
      product_id: order.product_id,
      quantity: order.quantity,
      total_price: order.total_price,
      ordered_at: Utc::now(),
    };
    self.orders.push(order.clone());
    Ok(order)
  }

  async fn remove_cart_lines(&mut self, buyer_id: Uuid, lines: &[CartLine]) -> MarketResult<u64> {
    if !self.carts_held.contains_key(&buyer_id) || lines.iter().any(|l| l.buyer_id != buyer_id) {
      return Err(MarketError::Invariant(format!(
        "cart removal for buyer {} without holding its cart lock",
        buyer_id
      )));
    }
    self.cart_removals.extend_from_slice(lines);
    Ok(lines.len() as u64)
  }

  async fn commit(self: Box<Self>) -> MarketResult<()> {
    let MemoryUnit {
      shared,
      held,
      carts_held,
      decrements,
      orders,
      cart_removals,
    } = *self;

    {
      let mut state = shared.state.write();

      // Verify everything before touching anything.
      for (listing_id, quantity) in &decrements {
        let stored = state
          .listings
          .get(listing_id)
          .ok_or_else(|| MarketError::Invariant(format!("listing {} vanished before commit", listing_id)))?;
        if stored.listing.quantity < *quantity {
          return Err(MarketError::Invariant(format!(
            "listing {} holds {} but the unit reserved {}",
            listing_id, stored.listing.quantity, quantity
          )));
        }
      }
      for line in &cart_removals {
        let current = state.cart.get(&(line.buyer_id, line.product_id));
        if current.map(|c| c.quantity) != Some(line.quantity) {
          return Err(MarketError::Invariant(format!(
            "cart line ({}, {}) changed before commit",
            line.buyer_id, line.product_id
          )));
        }
      }

      for (listing_id, quantity) in decrements {
        if let Some(stored) = state.listings.get_mut(&listing_id) {
          stored.listing.quantity -= quantity;
        }
      }
      state.orders.extend(orders);
      for line in cart_removals {
        state.cart.remove(&(line.buyer_id, line.product_id));
      }
    }

    debug!(row_locks = held.len(), cart_locks = carts_held.len(), "Memory unit committed.");
    drop(held);
    drop(carts_held);
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> MarketResult<()> {
    debug!(
      row_locks = self.held.len(),
      staged_orders = self.orders.len(),
      "Memory unit rolled back."
    );
    Ok(())
  }
}
