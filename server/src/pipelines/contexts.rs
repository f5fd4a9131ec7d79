// aquabulk/server/src/pipelines/contexts.rs

//! Data carried through each flow. Handlers receive these wrapped in
//! `aquabulk::FlowContext`; the HTTP handler reads the result fields back
//! once the flow completes.

use crate::state::AppState;
use aquabulk::model::{AvailableListing, BuyerOrderView, CartLine, CartLineView, Listing, Order, Role, SellerOrderView, User};
use aquabulk::{CheckoutReceipt, Principal};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A flow context acting on behalf of an authenticated principal.
pub trait PrincipalScoped {
  fn principal(&self) -> Principal;
  fn required_role(&self) -> Role;
}

macro_rules! scoped_to {
  ($ctx:ty, $role:expr) => {
    impl PrincipalScoped for $ctx {
      fn principal(&self) -> Principal {
        self.principal
      }
      fn required_role(&self) -> Role {
        $role
      }
    }
  };
}

// --- Public (no principal) ---

#[derive(Clone)]
pub struct SignupCtxData {
  pub app_state: AppState,
  pub username: String,
  pub password: String,
  pub role: String,
  pub created_user: Option<User>,
}

#[derive(Clone)]
pub struct SigninCtxData {
  pub app_state: AppState,
  pub username: String,
  pub password: String,
  pub user: Option<User>,
  pub authenticated: bool,
}

// --- Seller ---

#[derive(Clone)]
pub struct RestockCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub model_name: String,
  pub unit_price: Decimal,
  pub quantity: i32,
  pub listing: Option<Listing>,
}
scoped_to!(RestockCtxData, Role::Seller);

// --- Buyer ---

#[derive(Clone)]
pub struct PurchaseCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub product_id: Uuid,
  pub quantity: i32,
  pub order: Option<Order>,
}
scoped_to!(PurchaseCtxData, Role::Buyer);

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub product_id: Uuid,
  pub quantity: i32,
  pub updated_line: Option<CartLine>,
}
scoped_to!(AddToCartCtxData, Role::Buyer);

#[derive(Clone)]
pub struct ClearCartCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub removed: u64,
}
scoped_to!(ClearCartCtxData, Role::Buyer);

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub receipt: Option<CheckoutReceipt>,
}
scoped_to!(CheckoutCtxData, Role::Buyer);

// --- Read-only views ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketQuery {
  Catalogue,
  BuyerCart,
  BuyerOrders,
  SellerInventory,
  SellerOrders,
}

impl MarketQuery {
  pub fn required_role(&self) -> Role {
    match self {
      MarketQuery::Catalogue | MarketQuery::BuyerCart | MarketQuery::BuyerOrders => Role::Buyer,
      MarketQuery::SellerInventory | MarketQuery::SellerOrders => Role::Seller,
    }
  }
}

#[derive(Debug, Clone)]
pub enum QueryResult {
  Catalogue(Vec<AvailableListing>),
  BuyerCart(Vec<CartLineView>),
  BuyerOrders(Vec<BuyerOrderView>),
  SellerInventory(Vec<Listing>),
  SellerOrders {
    orders: Vec<SellerOrderView>,
    total_revenue: Decimal,
  },
}

#[derive(Clone)]
pub struct QueryCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub query: MarketQuery,
  pub result: Option<QueryResult>,
}

impl PrincipalScoped for QueryCtxData {
  fn principal(&self) -> Principal {
    self.principal
  }
  fn required_role(&self) -> Role {
    self.query.required_role()
  }
}
