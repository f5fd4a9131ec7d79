// aquabulk/server/tests/api_tests.rs
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{web, App};
use aquabulk::model::Role;
use aquabulk::store::{MarketStore, UnitOfWork};
use aquabulk_server::configure_app_routes;
use common::{as_principal, register, send, test_state, test_state_with_lock_wait, uuid_field, PASSWORD};
use futures_util::future::join;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

fn decimal(value: &Value) -> Decimal {
  value
    .as_str()
    .and_then(|s| s.parse().ok())
    .unwrap_or_else(|| panic!("not a decimal: {}", value))
}

fn restock_req(seller: Uuid, model: &str, quantity: i32, unit_price: &str) -> TestRequest {
  as_principal(TestRequest::post().uri("/api/seller/products"), seller, "seller").set_json(json!({
    "model_name": model,
    "quantity": quantity,
    "unit_price": unit_price,
  }))
}

fn buy_req(buyer: Uuid, product_id: Uuid, quantity: i32) -> TestRequest {
  as_principal(TestRequest::post().uri("/api/buyer/buy"), buyer, "buyer")
    .set_json(json!({ "product_id": product_id, "quantity": quantity }))
}

fn add_to_cart_req(buyer: Uuid, product_id: Uuid, quantity: i32) -> TestRequest {
  as_principal(TestRequest::post().uri("/api/buyer/cart"), buyer, "buyer")
    .set_json(json!({ "product_id": product_id, "quantity": quantity }))
}

#[actix_rt::test]
async fn health_endpoint_responds() {
  let state = test_state();
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let (status, body) = send(&app, TestRequest::get().uri("/api/health").to_request()).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

#[actix_rt::test]
async fn register_then_login() {
  let state = test_state();
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let req = TestRequest::post()
    .uri("/api/register")
    .set_json(json!({ "username": "Clearwater Springs", "password": PASSWORD, "role": "seller" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["role"], "seller");
  assert!(body.get("password_hash").is_none());
  let user_id = uuid_field(&body, "user_id");

  let req = TestRequest::post()
    .uri("/api/login")
    .set_json(json!({ "username": "Clearwater Springs", "password": PASSWORD }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(uuid_field(&body, "user_id"), user_id);
  assert_eq!(body["username"], "Clearwater Springs");

  let req = TestRequest::post()
    .uri("/api/login")
    .set_json(json!({ "username": "Clearwater Springs", "password": "wrong-pass" }))
    .to_request();
  assert_eq!(send(&app, req).await.0, StatusCode::UNAUTHORIZED);

  let req = TestRequest::post()
    .uri("/api/login")
    .set_json(json!({ "username": "Nobody", "password": PASSWORD }))
    .to_request();
  assert_eq!(send(&app, req).await.0, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn register_rejects_bad_input() {
  let state = test_state();
  register(&state, "Taken", Role::Buyer).await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  for payload in [
    json!({ "username": "Someone", "password": PASSWORD, "role": "admin" }),
    json!({ "username": "   ", "password": PASSWORD, "role": "buyer" }),
    json!({ "username": "Someone", "password": "abc", "role": "buyer" }),
    json!({ "username": "Taken", "password": PASSWORD, "role": "buyer" }),
  ] {
    let req = TestRequest::post().uri("/api/register").set_json(&payload).to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "payload {} was accepted", payload);
  }
}

#[actix_rt::test]
async fn principal_headers_are_required_and_role_checked() {
  let state = test_state();
  let seller = register(&state, "Clearwater Springs", Role::Seller).await;
  let buyer = register(&state, "Harbor Grocers", Role::Buyer).await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let (status, _) = send(&app, TestRequest::get().uri("/api/buyer/products").to_request()).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let req = TestRequest::get()
    .uri("/api/buyer/products")
    .insert_header(("X-User-ID", "garbled"))
    .insert_header(("X-User-Role", "buyer"))
    .to_request();
  assert_eq!(send(&app, req).await.0, StatusCode::UNAUTHORIZED);

  let req = as_principal(TestRequest::get().uri("/api/buyer/products"), seller, "seller").to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert!(body["error"].as_str().unwrap().contains("Not a buyer"));

  let req = restock_req(buyer, "Still 500ml", 5, "2.00").to_request();
  assert_eq!(send(&app, req).await.0, StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn restock_merges_and_shows_in_catalogue() {
  let state = test_state();
  let seller = register(&state, "Clearwater Springs", Role::Seller).await;
  let buyer = register(&state, "Harbor Grocers", Role::Buyer).await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let (status, first) = send(&app, restock_req(seller, "Model-X", 10, "1.50").to_request()).await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, second) = send(&app, restock_req(seller, "Model-X", 5, "1.50").to_request()).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(first["product"]["id"], second["product"]["id"]);
  assert_eq!(second["product"]["quantity"], 15);

  let (status, _) = send(&app, restock_req(seller, "Model-X", 5, "1.75").to_request()).await;
  assert_eq!(status, StatusCode::CREATED);

  let req = as_principal(TestRequest::get().uri("/api/seller/inventory"), seller, "seller").to_request();
  let (status, inventory) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(inventory.as_array().unwrap().len(), 2);

  let req = as_principal(TestRequest::get().uri("/api/buyer/products"), buyer, "buyer").to_request();
  let (status, catalogue) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  let catalogue = catalogue.as_array().unwrap();
  assert_eq!(catalogue.len(), 2);
  assert!(catalogue.iter().all(|l| l["seller_name"] == "Clearwater Springs"));

  for (quantity, price) in [(0, "1.50"), (5, "0"), (5, "1.505")] {
    let (status, _) = send(&app, restock_req(seller, "Model-Y", quantity, price).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}

#[actix_rt::test]
async fn purchase_maps_each_outcome_to_its_status() {
  let state = test_state();
  let seller = register(&state, "Clearwater Springs", Role::Seller).await;
  let buyer = register(&state, "Harbor Grocers", Role::Buyer).await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let (_, restocked) = send(&app, restock_req(seller, "Still 500ml", 5, "2.00").to_request()).await;
  let product_id = uuid_field(&restocked["product"], "id");

  let (status, body) = send(&app, buy_req(buyer, product_id, 3).to_request()).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(decimal(&body["order"]["total_price"]), Decimal::new(600, 2));
  assert_eq!(uuid_field(&body["order"], "seller_id"), seller);

  let (status, body) = send(&app, buy_req(buyer, product_id, 3).to_request()).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(uuid_field(&body, "product_id"), product_id);
  assert_eq!(body["requested"], 3);
  assert_eq!(body["available"], 2);

  assert_eq!(send(&app, buy_req(buyer, product_id, 0).to_request()).await.0, StatusCode::BAD_REQUEST);
  assert_eq!(send(&app, buy_req(buyer, Uuid::new_v4(), 1).to_request()).await.0, StatusCode::NOT_FOUND);

  let req = as_principal(TestRequest::get().uri("/api/buyer/orders"), buyer, "buyer").to_request();
  let (status, orders) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  let orders = orders.as_array().unwrap();
  assert_eq!(orders.len(), 1);
  assert_eq!(orders[0]["seller_name"], "Clearwater Springs");
}

#[actix_rt::test]
async fn concurrent_purchases_do_not_oversell() {
  let state = test_state();
  let seller = register(&state, "Clearwater Springs", Role::Seller).await;
  let buyer = register(&state, "Harbor Grocers", Role::Buyer).await;
  let other_buyer = register(&state, "Hilltop Cafe", Role::Buyer).await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let (_, restocked) = send(&app, restock_req(seller, "Still 500ml", 5, "2.00").to_request()).await;
  let product_id = uuid_field(&restocked["product"], "id");

  let ((first, _), (second, _)) = join(
    send(&app, buy_req(buyer, product_id, 3).to_request()),
    send(&app, buy_req(other_buyer, product_id, 3).to_request()),
  )
  .await;
  let mut statuses = vec![first.as_u16(), second.as_u16()];
  statuses.sort_unstable();
  assert_eq!(statuses, vec![201, 409]);

  let req = as_principal(TestRequest::get().uri("/api/seller/inventory"), seller, "seller").to_request();
  let (_, inventory) = send(&app, req).await;
  assert_eq!(inventory[0]["quantity"], 2);
}

#[actix_rt::test]
async fn checkout_is_all_or_nothing() {
  let state = test_state();
  let seller = register(&state, "Clearwater Springs", Role::Seller).await;
  let buyer = register(&state, "Harbor Grocers", Role::Buyer).await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let (_, a) = send(&app, restock_req(seller, "Sparkling 1L", 10, "3.00").to_request()).await;
  let (_, b) = send(&app, restock_req(seller, "Still 5L", 1, "4.00").to_request()).await;
  let a = uuid_field(&a["product"], "id");
  let b = uuid_field(&b["product"], "id");

  assert_eq!(send(&app, add_to_cart_req(buyer, a, 2).to_request()).await.0, StatusCode::OK);
  assert_eq!(send(&app, add_to_cart_req(buyer, b, 100).to_request()).await.0, StatusCode::OK);

  let checkout = || as_principal(TestRequest::post().uri("/api/buyer/checkout"), buyer, "buyer").to_request();
  let (status, body) = send(&app, checkout()).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(uuid_field(&body, "product_id"), b);

  let view_cart = || as_principal(TestRequest::get().uri("/api/buyer/cart"), buyer, "buyer").to_request();
  let (_, cart) = send(&app, view_cart()).await;
  assert_eq!(cart["items"].as_array().unwrap().len(), 2);

  let req = as_principal(TestRequest::get().uri("/api/seller/inventory"), seller, "seller").to_request();
  let (_, inventory) = send(&app, req).await;
  let a_on_hand = inventory
    .as_array()
    .unwrap()
    .iter()
    .find(|l| uuid_field(l, "id") == a)
    .map(|l| l["quantity"].clone());
  assert_eq!(a_on_hand, Some(json!(10)));

  let req = as_principal(TestRequest::get().uri("/api/buyer/orders"), buyer, "buyer").to_request();
  let (_, orders) = send(&app, req).await;
  assert!(orders.as_array().unwrap().is_empty());

  let clear = as_principal(TestRequest::delete().uri("/api/buyer/cart"), buyer, "buyer").to_request();
  let (status, body) = send(&app, clear).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["removed"], 2);

  let (status, _) = send(&app, checkout()).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  send(&app, add_to_cart_req(buyer, a, 2).to_request()).await;
  send(&app, add_to_cart_req(buyer, b, 1).to_request()).await;
  let (_, cart) = send(&app, view_cart()).await;
  assert_eq!(decimal(&cart["total"]), Decimal::new(1000, 2));

  let (status, body) = send(&app, checkout()).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["orders"].as_array().unwrap().len(), 2);
  assert_eq!(decimal(&body["total"]), Decimal::new(1000, 2));

  let (_, cart) = send(&app, view_cart()).await;
  assert!(cart["items"].as_array().unwrap().is_empty());

  let req = as_principal(TestRequest::get().uri("/api/seller/orders"), seller, "seller").to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["orders"].as_array().unwrap().len(), 2);
  assert_eq!(decimal(&body["totalRevenue"]), Decimal::new(1000, 2));
  assert!(body["orders"]
    .as_array()
    .unwrap()
    .iter()
    .all(|o| o["buyer_name"] == "Harbor Grocers"));
}

#[actix_rt::test]
async fn seller_without_orders_has_zero_revenue() {
  let state = test_state();
  let seller = register(&state, "Alpine Source", Role::Seller).await;
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let req = as_principal(TestRequest::get().uri("/api/seller/orders"), seller, "seller").to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["orders"].as_array().unwrap().is_empty());
  assert_eq!(decimal(&body["totalRevenue"]), Decimal::ZERO);
}

#[actix_rt::test]
async fn busy_listing_yields_service_unavailable() {
  let state = test_state_with_lock_wait(Duration::from_millis(50));
  let seller = register(&state, "Clearwater Springs", Role::Seller).await;
  let buyer = register(&state, "Harbor Grocers", Role::Buyer).await;
  let listing = state
    .market
    .inventory
    .restock(seller, "Still 500ml", Decimal::new(200, 2), 5)
    .await
    .unwrap();
  let store = state.market.store().clone();
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let mut holder = store.begin().await.unwrap();
  holder.lock_listing(listing.id).await.unwrap();

  let (status, body) = send(&app, buy_req(buyer, listing.id, 1).to_request()).await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(uuid_field(&body, "product_id"), listing.id);

  holder.rollback().await.unwrap();
  let (status, _) = send(&app, buy_req(buyer, listing.id, 1).to_request()).await;
  assert_eq!(status, StatusCode::CREATED);
}
