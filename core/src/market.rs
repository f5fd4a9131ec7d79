// aquabulk/core/src/market.rs

use crate::accounts::AccountDirectory;
use crate::cart::CartStore;
use crate::engine::TransactionEngine;
use crate::inventory::InventoryLedger;
use crate::orders::OrderLedger;
use crate::store::{MarketStore, MemoryStore};
use std::sync::Arc;

/// Every marketplace component wired to one shared store.
#[derive(Clone)]
pub struct Market {
  store: Arc<dyn MarketStore>,
  pub accounts: AccountDirectory,
  pub inventory: InventoryLedger,
  pub cart: CartStore,
  pub orders: OrderLedger,
  pub engine: TransactionEngine,
}

impl Market {
  pub fn new(store: Arc<dyn MarketStore>) -> Self {
    Self {
      accounts: AccountDirectory::new(Arc::clone(&store)),
      inventory: InventoryLedger::new(Arc::clone(&store)),
      cart: CartStore::new(Arc::clone(&store)),
      orders: OrderLedger::new(Arc::clone(&store)),
      engine: TransactionEngine::new(Arc::clone(&store)),
      store,
    }
  }

  /// A market over an in-memory store; clones of `store` share its data.
  pub fn in_memory(store: MemoryStore) -> Self {
    Self::new(Arc::new(store))
  }

  pub fn store(&self) -> &Arc<dyn MarketStore> {
    &self.store
  }
}
