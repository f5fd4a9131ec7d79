// aquabulk/server/src/services/auth_service.rs

//! Password hashing for registration and credential checks at login.

use crate::errors::AppError;
use actix_web::error::BlockingError;
use actix_web::web;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use tracing::{debug, error, instrument};

pub const MIN_PASSWORD_LEN: usize = 4;

/// Hashes `password` with a fresh random salt (Argon2 defaults).
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(AppError::Validation(format!(
      "Password must be at least {} characters long.",
      MIN_PASSWORD_LEN
    )));
  }

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|argon_err| {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing process failed: {}", argon_err))
    })
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unusable.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool, AppError> {
  if provided_password.is_empty() {
    return Ok(false);
  }
  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password mismatch.");
      Ok(false)
    }
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!(
        "Password verification process failed: {}",
        other_argon_err
      )))
    }
  }
}

fn blocking_failed(err: BlockingError) -> AppError {
  error!(error = %err, "Password hashing task did not complete.");
  AppError::Internal("Password hashing task did not complete.".to_string())
}

/// `hash_password` on the blocking pool, off the async workers.
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
  web::block(move || hash_password(&password)).await.map_err(blocking_failed)?
}

/// `verify_password` on the blocking pool, off the async workers.
pub async fn verify_password_blocking(stored_hash: String, provided_password: String) -> Result<bool, AppError> {
  web::block(move || verify_password(&stored_hash, &provided_password))
    .await
    .map_err(blocking_failed)?
}
