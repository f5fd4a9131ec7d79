// aquabulk/server/src/web/routes.rs

use crate::web::handlers::{auth_handlers, cart_handlers, checkout_handlers, order_handlers, product_handlers};
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      // Public account routes
      .route("/register", web::post().to(auth_handlers::register_handler))
      .route("/login", web::post().to(auth_handlers::login_handler))
      // Seller routes
      .service(
        web::scope("/seller")
          .route("/products", web::post().to(product_handlers::restock_handler))
          .route("/inventory", web::get().to(product_handlers::seller_inventory_handler))
          .route("/orders", web::get().to(order_handlers::seller_orders_handler)),
      )
      // Buyer routes
      .service(
        web::scope("/buyer")
          .route("/products", web::get().to(product_handlers::catalogue_handler))
          .route("/buy", web::post().to(checkout_handlers::buy_handler))
          .service(
            web::resource("/cart")
              .route(web::post().to(cart_handlers::add_to_cart_handler))
              .route(web::get().to(cart_handlers::view_cart_handler))
              .route(web::delete().to(cart_handlers::clear_cart_handler)),
          )
          .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
          .route("/orders", web::get().to(order_handlers::buyer_orders_handler)),
      ),
  );
}
