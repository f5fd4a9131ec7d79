// aquabulk/core/tests/cart_tests.rs
mod common;

use aquabulk::MarketError;
use common::{price, Fixture};
use uuid::Uuid;

#[tokio::test]
async fn repeated_adds_sum_quantities() {
  let fx = Fixture::new().await;
  let listing = fx.listing("Still 500ml", 250, 10).await;

  fx.market.cart.add(fx.buyer.id, listing.id, 2).await.unwrap();
  let line = fx.market.cart.add(fx.buyer.id, listing.id, 3).await.unwrap();
  assert_eq!(line.quantity, 5);

  let view = fx.market.cart.list(fx.buyer.id).await.unwrap();
  assert_eq!(view.len(), 1);
  assert_eq!(view[0].quantity, 5);
  assert_eq!(view[0].unit_price, price(250));
  assert_eq!(view[0].line_total, price(1250));
  assert_eq!(view[0].seller_name, "Clearwater Springs");
}

#[tokio::test]
async fn adding_more_than_stock_is_allowed_until_checkout() {
  let fx = Fixture::new().await;
  let listing = fx.listing("Still 500ml", 250, 1).await;
  let line = fx.market.cart.add(fx.buyer.id, listing.id, 100).await.unwrap();
  assert_eq!(line.quantity, 100);
  assert_eq!(fx.quantity_of(&listing).await, 1);
}

#[tokio::test]
async fn add_rejects_bad_quantity_and_unknown_product() {
  let fx = Fixture::new().await;
  let listing = fx.listing("Still 500ml", 250, 10).await;

  assert!(matches!(
    fx.market.cart.add(fx.buyer.id, listing.id, 0).await,
    Err(MarketError::Validation(_))
  ));
  assert!(matches!(
    fx.market.cart.add(fx.buyer.id, Uuid::new_v4(), 1).await,
    Err(MarketError::NotFound(_))
  ));
  assert!(fx.market.cart.list(fx.buyer.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn carts_are_per_buyer() {
  let fx = Fixture::new().await;
  let listing = fx.listing("Still 500ml", 250, 10).await;
  fx.market.cart.add(fx.buyer.id, listing.id, 2).await.unwrap();
  fx.market.cart.add(fx.other_buyer.id, listing.id, 7).await.unwrap();

  assert_eq!(fx.market.cart.list(fx.buyer.id).await.unwrap()[0].quantity, 2);
  assert_eq!(fx.market.cart.list(fx.other_buyer.id).await.unwrap()[0].quantity, 7);
}

#[tokio::test]
async fn clear_is_idempotent() {
  let fx = Fixture::new().await;
  let a = fx.listing("Still 500ml", 250, 10).await;
  let b = fx.listing("Sparkling 1L", 300, 10).await;
  fx.market.cart.add(fx.buyer.id, a.id, 1).await.unwrap();
  fx.market.cart.add(fx.buyer.id, b.id, 1).await.unwrap();
  fx.market.cart.add(fx.other_buyer.id, a.id, 1).await.unwrap();

  assert_eq!(fx.market.cart.clear(fx.buyer.id).await.unwrap(), 2);
  assert_eq!(fx.market.cart.clear(fx.buyer.id).await.unwrap(), 0);
  assert!(fx.market.cart.list(fx.buyer.id).await.unwrap().is_empty());
  assert_eq!(fx.market.cart.list(fx.other_buyer.id).await.unwrap().len(), 1);
}
