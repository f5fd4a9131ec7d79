// aquabulk/core/src/accounts.rs

//! User directory. Password hashing happens before anything reaches here.

use crate::error::{MarketError, MarketResult};
use crate::model::{NewUser, Role, User};
use crate::store::MarketStore;
use std::sync::Arc;
use tracing::{info, instrument};

const MAX_USERNAME_LEN: usize = 64;

#[derive(Clone)]
pub struct AccountDirectory {
  store: Arc<dyn MarketStore>,
}

impl AccountDirectory {
  pub fn new(store: Arc<dyn MarketStore>) -> Self {
    Self { store }
  }

  #[instrument(name = "AccountDirectory::register", skip(self, password_hash), err(Display))]
  pub async fn register(&self, username: &str, password_hash: String, role: Role) -> MarketResult<User> {
    let username = username.trim();
    if username.is_empty() {
      return Err(MarketError::Validation("Username is required.".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
      return Err(MarketError::Validation(format!(
        "Username may be at most {} characters.",
        MAX_USERNAME_LEN
      )));
    }
    let user = self
      .store
      .insert_user(NewUser {
        username: username.to_string(),
        password_hash,
        role,
      })
      .await?;
    info!(user_id = %user.id, role = %user.role, "User registered.");
    Ok(user)
  }

  pub async fn find_by_username(&self, username: &str) -> MarketResult<Option<User>> {
    self.store.find_user_by_username(username.trim()).await
  }
}
