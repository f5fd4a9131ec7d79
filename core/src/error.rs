// aquabulk/core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the flow engine itself (as opposed to the handlers it runs).
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No flow registered for context type {type_name}")]
  NotRegistered { type_name: String },

  #[error("Type mismatch during context downcast (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("Error in flow handler. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::Handler { source: err }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;

/// Every failure the marketplace core can report. Each variant maps to its
/// own response class.
#[derive(Debug, Error)]
pub enum MarketError {
  /// Malformed input. Detected before any storage access.
  #[error("Validation Error: {0}")]
  Validation(String),

  /// The principal does not hold the role an operation requires.
  #[error("Access denied: {0}")]
  Forbidden(String),

  /// A referenced listing, product or user does not exist.
  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// The locked quantity of a listing cannot cover the request. A normal,
  /// user-facing outcome; the unit of work is rolled back before it is reported.
  #[error("Insufficient quantity for product ID: {product_id} (requested {requested}, available {available})")]
  InsufficientStock {
    product_id: Uuid,
    requested: i32,
    available: i32,
  },

  #[error("Cart is empty")]
  EmptyCart,

  /// Waiting for a listing's row lock took longer than the configured bound.
  #[error("Timed out waiting for the stock lock on product ID: {product_id}")]
  LockTimeout { product_id: Uuid },

  /// Waiting for a buyer's cart lock (held by a checkout in progress) took
  /// longer than the configured bound.
  #[error("Timed out waiting for the cart lock of buyer ID: {buyer_id}")]
  CartLockTimeout { buyer_id: Uuid },

  /// Unexpected fault inside an atomic unit of work. The unit was rolled back;
  /// `source` carries the detail for logs and is never shown to clients.
  #[error("Transaction failed during {operation}")]
  TransactionFailed {
    operation: &'static str,
    #[source]
    source: Box<MarketError>,
  },

  /// A storage-level invariant did not hold (e.g. a decrement on an unlocked row).
  #[error("Storage invariant violated: {0}")]
  Invariant(String),

  #[error("Database Error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Flow Error: {source}")]
  Flow {
    #[from]
    source: FlowError,
  },
}

impl MarketError {
  /// Outcomes that are part of normal operation and pass through the
  /// transaction engine unchanged.
  pub fn is_expected_outcome(&self) -> bool {
    matches!(
      self,
      MarketError::Validation(_)
        | MarketError::Forbidden(_)
        | MarketError::NotFound(_)
        | MarketError::InsufficientStock { .. }
        | MarketError::EmptyCart
        | MarketError::LockTimeout { .. }
        | MarketError::CartLockTimeout { .. }
    )
  }

  /// The product a failure refers to, when there is one.
  pub fn offending_product(&self) -> Option<Uuid> {
    match self {
      MarketError::InsufficientStock { product_id, .. } | MarketError::LockTimeout { product_id } => {
        Some(*product_id)
      }
      _ => None,
    }
  }
}

pub type MarketResult<T, E = MarketError> = std::result::Result<T, E>;
