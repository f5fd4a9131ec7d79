// aquabulk/core/src/access.rs

//! The single capability check run before every marketplace operation.

use crate::error::{MarketError, MarketResult};
use crate::model::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user as vouched for by the identity gateway.
/// The core trusts the role it carries and performs no authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub user_id: Uuid,
  pub role: Role,
}

impl Principal {
  pub fn new(user_id: Uuid, role: Role) -> Self {
    Self { user_id, role }
  }

  pub fn seller(user_id: Uuid) -> Self {
    Self::new(user_id, Role::Seller)
  }

  pub fn buyer(user_id: Uuid) -> Self {
    Self::new(user_id, Role::Buyer)
  }

  /// Principal must hold `role`; otherwise `Forbidden`.
  pub fn require(&self, role: Role) -> MarketResult<()> {
    if self.role == role {
      Ok(())
    } else {
      tracing::warn!(user_id = %self.user_id, held = %self.role, required = %role, "Capability check failed.");
      Err(MarketError::Forbidden(format!("Not a {}", role)))
    }
  }
}
