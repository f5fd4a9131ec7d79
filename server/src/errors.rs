// aquabulk/server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use aquabulk::{FlowError, MarketError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Market(#[from] MarketError),

  /// Malformed request input caught before it reaches the market core.
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Flow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),

  /// A flow stopped before producing its result.
  #[error("Flow execution was halted by a handler.")]
  PipelineHaltedByHandler,
}

const GENERIC_FAILURE: &str = "The transaction could not be completed. Please try again.";

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Market(market_err) => match market_err {
        MarketError::Validation(_) | MarketError::EmptyCart => StatusCode::BAD_REQUEST,
        MarketError::Forbidden(_) => StatusCode::FORBIDDEN,
        MarketError::NotFound(_) => StatusCode::NOT_FOUND,
        MarketError::InsufficientStock { .. } => StatusCode::CONFLICT,
        MarketError::LockTimeout { .. } | MarketError::CartLockTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
        MarketError::TransactionFailed { .. }
        | MarketError::Invariant(_)
        | MarketError::Database(_)
        | MarketError::Flow { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::PipelineHaltedByHandler => StatusCode::CONFLICT,
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, detail = ?self, "Responding with error");
    } else {
      tracing::info!(application_error = %self, status = status.as_u16(), "Responding with error");
    }

    let body = match self {
      AppError::Market(MarketError::Validation(m)) | AppError::Validation(m) => json!({ "error": m }),
      AppError::Market(MarketError::EmptyCart) => json!({ "error": "Cart is empty." }),
      AppError::Market(MarketError::Forbidden(m)) => json!({ "error": format!("Access denied: {}", m) }),
      AppError::Market(MarketError::NotFound(m)) => json!({ "error": m }),
      AppError::Market(MarketError::InsufficientStock {
        product_id,
        requested,
        available,
      }) => json!({
        "error": "Insufficient quantity for product.",
        "product_id": product_id,
        "requested": requested,
        "available": available,
      }),
      AppError::Market(MarketError::LockTimeout { product_id }) => json!({
        "error": "The product is busy. Please try again.",
        "product_id": product_id,
      }),
      AppError::Market(MarketError::CartLockTimeout { .. }) => json!({
        "error": "A checkout for this cart is in progress. Please try again.",
      }),
      AppError::Auth(m) => json!({ "error": m }),
      AppError::PipelineHaltedByHandler => json!({ "error": "Process halted as expected by business logic." }),
      // Internal detail stays in the logs.
      _ => json!({ "error": GENERIC_FAILURE }),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
