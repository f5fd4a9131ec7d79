// aquabulk/core/tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every fixture

use aquabulk::model::Role;
use aquabulk::store::MemoryStore;
use aquabulk::{Listing, Market, User};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::Level;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// `cents` hundredths, e.g. `price(250)` is 2.50.
pub fn price(cents: i64) -> Decimal {
  Decimal::new(cents, 2)
}

/// An in-memory market with two sellers and two buyers already registered.
pub struct Fixture {
  pub market: Market,
  pub store: MemoryStore,
  pub seller: User,
  pub other_seller: User,
  pub buyer: User,
  pub other_buyer: User,
}

impl Fixture {
  pub async fn new() -> Self {
    Self::with_lock_wait(aquabulk::DEFAULT_LOCK_WAIT).await
  }

  pub async fn with_lock_wait(lock_wait: Duration) -> Self {
    setup_tracing();
    let store = MemoryStore::with_lock_wait(lock_wait);
    let market = Market::in_memory(store.clone());
    let register = |name: &'static str, role: Role| {
      let market = market.clone();
      async move {
        market
          .accounts
          .register(name, "not-a-real-hash".to_string(), role)
          .await
          .expect("fixture user registers")
      }
    };
    let seller = register("Clearwater Springs", Role::Seller).await;
    let other_seller = register("Alpine Source", Role::Seller).await;
    let buyer = register("Harbor Grocers", Role::Buyer).await;
    let other_buyer = register("Hilltop Cafe", Role::Buyer).await;
    Self {
      market,
      store,
      seller,
      other_seller,
      buyer,
      other_buyer,
    }
  }

  /// Restocks `quantity` of `model` at `cents` for the primary seller.
  pub async fn listing(&self, model: &str, cents: i64, quantity: i32) -> Listing {
    self
      .market
      .inventory
      .restock(self.seller.id, model, price(cents), quantity)
      .await
      .expect("fixture restock succeeds")
  }

  pub async fn quantity_of(&self, listing: &Listing) -> i32 {
    self
      .market
      .inventory
      .get(listing.id)
      .await
      .expect("listing lookup")
      .expect("listing exists")
      .quantity
  }
}
