// aquabulk/server/src/lib.rs

//! HTTP service for the Aquabulk marketplace. `main.rs` wires it to a
//! store and runs it; tests drive `configure_app_routes` in-process.

pub mod config;
pub mod errors;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;

pub use config::{AppConfig, LogFormat, StoreBackend};
pub use errors::AppError;
pub use state::AppState;
pub use web::configure_app_routes;
