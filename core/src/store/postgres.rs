// aquabulk/core/src/store/postgres.rs

//! PostgreSQL backend.
//!
//! A unit of work is one `sqlx` transaction. `lock_timeout` is set locally on
//! every transaction so `SELECT ... FOR UPDATE` waits at most the configured
//! bound, and a lock wait that expires surfaces as `LockTimeout`.

use crate::error::{MarketError, MarketResult};
use crate::model::{
  AvailableListing, BuyerOrderView, CartLine, CartLineView, Listing, NewOrder, NewUser, Order, Restock,
  SellerOrderView, User,
};
use crate::store::{MarketStore, UnitOfWork, DEFAULT_LOCK_WAIT};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const LOCK_NOT_AVAILABLE: &str = "55P03";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";
const NUMERIC_OUT_OF_RANGE: &str = "22003";
const CHECK_VIOLATION: &str = "23514";

const LISTING_COLUMNS: &str = "id, seller_id, model_name, unit_price, quantity, created_at";

fn sqlstate(err: &sqlx::Error) -> Option<String> {
  match err {
    sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
    _ => None,
  }
}

/// Maps a lock-wait expiry on `listing_id` to `LockTimeout`; anything else
/// stays a database error.
fn lock_error(err: sqlx::Error, listing_id: Uuid) -> MarketError {
  if sqlstate(&err).as_deref() == Some(LOCK_NOT_AVAILABLE) {
    warn!(%listing_id, "Row lock wait exceeded.");
    MarketError::LockTimeout { product_id: listing_id }
  } else {
    MarketError::Database(err)
  }
}

fn cart_lock_error(err: sqlx::Error, buyer_id: Uuid) -> MarketError {
  if sqlstate(&err).as_deref() == Some(LOCK_NOT_AVAILABLE) {
    warn!(%buyer_id, "Cart lock wait exceeded.");
    MarketError::CartLockTimeout { buyer_id }
  } else {
    MarketError::Database(err)
  }
}

#[derive(Debug, Clone)]
pub struct PostgresStore {
  pool: PgPool,
  lock_wait: Duration,
}

impl PostgresStore {
  pub fn new(pool: PgPool, lock_wait: Duration) -> Self {
    Self { pool, lock_wait }
  }

  pub fn with_default_lock_wait(pool: PgPool) -> Self {
    Self::new(pool, DEFAULT_LOCK_WAIT)
  }

  #[instrument(name = "PostgresStore::connect", skip(database_url), err(Display))]
  pub async fn connect(database_url: &str, max_connections: u32, lock_wait: Duration) -> MarketResult<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    info!("Connected to PostgreSQL.");
    Ok(Self::new(pool, lock_wait))
  }

  /// Applies the embedded migrations under `core/migrations`.
  #[instrument(name = "PostgresStore::migrate", skip(self), err(Display))]
  pub async fn migrate(&self) -> MarketResult<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| MarketError::Database(e.into()))?;
    info!("Database migrations applied.");
    Ok(())
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  async fn begin_tx(&self) -> MarketResult<Transaction<'static, Postgres>> {
    let mut tx = self.pool.begin().await?;
    sqlx::query("SELECT set_config('lock_timeout', $1, true)")
      .bind(format!("{}ms", self.lock_wait.as_millis()))
      .execute(&mut *tx)
      .await?;
    Ok(tx)
  }
}

#[async_trait]
impl MarketStore for PostgresStore {
  async fn begin(&self) -> MarketResult<Box<dyn UnitOfWork>> {
    let tx = self.begin_tx().await?;
    Ok(Box::new(PgUnit { tx }))
  }

  async fn insert_user(&self, new_user: NewUser) -> MarketResult<User> {
    sqlx::query_as::<_, User>(
      "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) \
       RETURNING id, username, password_hash, role, created_at",
    )
    .bind(&new_user.username)
    .bind(&new_user.password_hash)
    .bind(new_user.role)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| match sqlstate(&e).as_deref() {
      Some(UNIQUE_VIOLATION) => {
        MarketError::Validation(format!("Username '{}' is already registered.", new_user.username))
      }
      _ => MarketError::Database(e),
    })
  }

  async fn find_user_by_username(&self, username: &str) -> MarketResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
      "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(&self.pool)
    .await?;
    Ok(user)
  }

  async fn upsert_listing(&self, restock: &Restock) -> MarketResult<Listing> {
    // The upsert locks the conflicting row; bound the wait like a reservation.
    let mut tx = self.begin_tx().await?;
    let sql = format!(
      "INSERT INTO listings (seller_id, model_name, unit_price, quantity) VALUES ($1, $2, $3, $4) \
       ON CONFLICT (seller_id, model_name, unit_price) \
       DO UPDATE SET quantity = listings.quantity + EXCLUDED.quantity \
       RETURNING {}",
      LISTING_COLUMNS
    );
    let listing = sqlx::query_as::<_, Listing>(&sql)
      .bind(restock.seller_id)
      .bind(&restock.model_name)
      .bind(restock.unit_price)
      .bind(restock.quantity)
      .fetch_one(&mut *tx)
      .await
      .map_err(|e| match sqlstate(&e).as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => MarketError::NotFound(format!("Seller {} not found.", restock.seller_id)),
        Some(NUMERIC_OUT_OF_RANGE) => {
          MarketError::Validation("Restock would overflow the listing quantity.".to_string())
        }
        _ => MarketError::Database(e),
      })?;
    tx.commit().await?;
    debug!(listing_id = %listing.id, quantity = listing.quantity, "Listing upserted.");
    Ok(listing)
  }

  async fn find_listing(&self, listing_id: Uuid) -> MarketResult<Option<Listing>> {
    let sql = format!("SELECT {} FROM listings WHERE id = $1", LISTING_COLUMNS);
    let listing = sqlx::query_as::<_, Listing>(&sql)
      .bind(listing_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(listing)
  }

  async fn available_listings(&self) -> MarketResult<Vec<AvailableListing>> {
    let rows = sqlx::query_as::<_, AvailableListing>(
      "SELECT l.id, l.seller_id, u.username AS seller_name, l.model_name, l.unit_price, l.quantity, l.created_at \
       FROM listings l JOIN users u ON u.id = l.seller_id \
       ORDER BY l.created_at DESC, l.id",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(rows)
  }

  async fn seller_listings(&self, seller_id: Uuid) -> MarketResult<Vec<Listing>> {
    let sql = format!(
      "SELECT {} FROM listings WHERE seller_id = $1 ORDER BY created_at DESC, id",
      LISTING_COLUMNS
    );
    let rows = sqlx::query_as::<_, Listing>(&sql)
      .bind(seller_id)
      .fetch_all(&self.pool)
      .await?;
    Ok(rows)
  }

  async fn upsert_cart_line(&self, buyer_id: Uuid, product_id: Uuid, quantity: i32) -> MarketResult<CartLine> {
    sqlx::query_as::<_, CartLine>(
      "INSERT INTO cart_lines (buyer_id, product_id, quantity) VALUES ($1, $2, $3) \
       ON CONFLICT (buyer_id, product_id) \
       DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity \
       RETURNING buyer_id, product_id, quantity, added_at",
    )
    .bind(buyer_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| match sqlstate(&e).as_deref() {
      Some(FOREIGN_KEY_VIOLATION) => MarketError::NotFound(format!("Product {} not found.", product_id)),
      Some(NUMERIC_OUT_OF_RANGE) => MarketError::Validation("Cart quantity would overflow.".to_string()),
      _ => MarketError::Database(e),
    })
  }

  async fn cart_view(&self, buyer_id: Uuid) -> MarketResult<Vec<CartLineView>> {
    let rows = sqlx::query_as::<_, CartLineView>(
      "SELECT c.product_id, c.quantity, l.unit_price, l.unit_price * c.quantity AS line_total, \
              l.model_name, l.seller_id, u.username AS seller_name, c.added_at \
       FROM cart_lines c \
       JOIN listings l ON l.id = c.product_id \
       JOIN users u ON u.id = l.seller_id \
       WHERE c.buyer_id = $1 \
       ORDER BY c.added_at, c.product_id",
    )
    .bind(buyer_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(rows)
  }

  async fn delete_cart(&self, buyer_id: Uuid) -> MarketResult<u64> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE buyer_id = $1")
      .bind(buyer_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected())
  }

  async fn buyer_orders(&self, buyer_id: Uuid) -> MarketResult<Vec<BuyerOrderView>> {
    let rows = sqlx::query_as::<_, BuyerOrderView>(
      "SELECT o.id, o.product_id, l.model_name, o.quantity, o.total_price, o.ordered_at, \
              o.seller_id, u.username AS seller_name \
       FROM orders o \
       JOIN listings l ON l.id = o.product_id \
       JOIN users u ON u.id = o.seller_id \
       WHERE o.buyer_id = $1 \
       ORDER BY o.ordered_at DESC, o.id",
    )
    .bind(buyer_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(rows)
  }

  async fn seller_orders(&self, seller_id: Uuid) -> MarketResult<Vec<SellerOrderView>> {
    let rows = sqlx::query_as::<_, SellerOrderView>(
      "SELECT o.id, o.product_id, l.model_name, o.quantity, o.total_price, o.ordered_at, \
              o.buyer_id, u.username AS buyer_name \
       FROM orders o \
       JOIN listings l ON l.id = o.product_id \
       JOIN users u ON u.id = o.buyer_id \
       WHERE o.seller_id = $1 \
       ORDER BY o.ordered_at DESC, o.id",
    )
    .bind(seller_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(rows)
  }

  async fn seller_revenue(&self, seller_id: Uuid) -> MarketResult<Decimal> {
    let total: Decimal =
      sqlx::query_scalar("SELECT COALESCE(SUM(total_price), 0)::NUMERIC FROM orders WHERE seller_id = $1")
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;
    Ok(total)
  }
}

/// One open transaction. Dropping it without `commit` rolls back.
struct PgUnit {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnit {
  async fn lock_cart_lines(&mut self, buyer_id: Uuid) -> MarketResult<Vec<CartLine>> {
    let lines = sqlx::query_as::<_, CartLine>(
      "SELECT buyer_id, product_id, quantity, added_at FROM cart_lines \
       WHERE buyer_id = $1 ORDER BY product_id FOR UPDATE",
    )
    .bind(buyer_id)
    .fetch_all(&mut *self.tx)
    .await
    .map_err(|e| cart_lock_error(e, buyer_id))?;
    Ok(lines)
  }

  async fn lock_listing(&mut self, listing_id: Uuid) -> MarketResult<Option<Listing>> {
    let sql = format!("SELECT {} FROM listings WHERE id = $1 FOR UPDATE", LISTING_COLUMNS);
    sqlx::query_as::<_, Listing>(&sql)
      .bind(listing_id)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(|e| lock_error(e, listing_id))
  }

  async fn decrement_listing(&mut self, listing_id: Uuid, quantity: i32) -> MarketResult<Listing> {
    let sql = format!(
      "UPDATE listings SET quantity = quantity - $2 WHERE id = $1 AND quantity >= $2 RETURNING {}",
      LISTING_COLUMNS
    );
    let updated = sqlx::query_as::<_, Listing>(&sql)
      .bind(listing_id)
      .bind(quantity)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(|e| match sqlstate(&e).as_deref() {
        Some(CHECK_VIOLATION) => MarketError::Invariant(format!("listing {} quantity check failed", listing_id)),
        _ => lock_error(e, listing_id),
      })?;
    updated.ok_or_else(|| {
      MarketError::Invariant(format!(
        "decrement of listing {} by {} matched no row",
        listing_id, quantity
      ))
    })
  }

  async fn insert_order(&mut self, order: NewOrder) -> MarketResult<Order> {
    let inserted = sqlx::query_as::<_, Order>(
      "INSERT INTO orders (buyer_id, seller_id, product_id, quantity, total_price) \
       VALUES ($1, $2, $3, $4, $5) \
       RETURNING id, buyer_id, seller_id, product_id, quantity, total_price, ordered_at",
    )
    .bind(order.buyer_id)
    .bind(order.seller_id)
    .bind(order.product_id)
    .bind(order.quantity)
    .bind(order.total_price)
    .fetch_one(&mut *self.tx)
    .await?;
    Ok(inserted)
  }

  async fn remove_cart_lines(&mut self, buyer_id: Uuid, lines: &[CartLine]) -> MarketResult<u64> {
    // The lines are row-locked by `lock_cart_lines`, so nobody has changed them.
    let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let result = sqlx::query("DELETE FROM cart_lines WHERE buyer_id = $1 AND product_id = ANY($2)")
      .bind(buyer_id)
      .bind(product_ids)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected())
  }

  async fn commit(self: Box<Self>) -> MarketResult<()> {
    self.tx.commit().await?;
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> MarketResult<()> {
    self.tx.rollback().await?;
    Ok(())
  }
}
