// aquabulk/core/src/model/mod.rs

//! Records persisted by the store backends and the read views joined from them.

pub mod cart_line;
pub mod listing;
pub mod order;
pub mod user;

pub use cart_line::{CartLine, CartLineView};
pub use listing::{AvailableListing, Listing, Restock};
pub use order::{BuyerOrderView, NewOrder, Order, SellerOrderView};
pub use user::{NewUser, Role, User};
