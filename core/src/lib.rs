// aquabulk/core/src/lib.rs

//! Aquabulk: order-fulfillment core of a wholesale bottled-water marketplace.
//!
//! Sellers restock listings, buyers fill carts, and the transaction engine
//! turns purchases and checkouts into orders without ever overselling:
//!  - every reservation happens under the listing's row lock, inside one
//!    atomic unit of work that commits or rolls back as a whole;
//!  - order records are append-only and priced at reservation time;
//!  - storage is injected as an `Arc<dyn MarketStore>` (PostgreSQL or in-memory).
//!
//! The `flow` module is a small step-pipeline runner the service layer uses
//! to compose each request (capability check first, then the operation).

pub mod access;
pub mod accounts;
pub mod cart;
pub mod engine;
pub mod error;
pub mod flow;
pub mod inventory;
pub mod market;
pub mod model;
pub mod orders;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::access::Principal;
pub use crate::accounts::AccountDirectory;
pub use crate::cart::CartStore;
pub use crate::engine::{CheckoutReceipt, TransactionEngine};
pub use crate::error::{FlowError, FlowResult, MarketError, MarketResult};
pub use crate::flow::{Flow, FlowContext, FlowOutcome, FlowRegistry, StepControl};
pub use crate::inventory::{InventoryLedger, Reservation};
pub use crate::market::Market;
pub use crate::model::{
  AvailableListing, BuyerOrderView, CartLine, CartLineView, Listing, Order, Role, SellerOrderView, User,
};
pub use crate::orders::OrderLedger;
pub use crate::store::{MarketStore, MemoryStore, PostgresStore, UnitOfWork, DEFAULT_LOCK_WAIT};
