// aquabulk/server/src/web/extractors.rs

use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};
use aquabulk::model::Role;
use aquabulk::Principal;
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// The principal forwarded by the identity gateway.
///
/// The gateway has already verified the caller's token; this service trusts
/// the two headers it sets and does no authentication of its own.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedPrincipal(pub Principal);

impl AuthenticatedPrincipal {
  pub fn into_inner(self) -> Principal {
    self.0
  }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers.get(name).and_then(|v| v.to_str().ok())
}

fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, AppError> {
  let user_id = header_str(headers, USER_ID_HEADER)
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
    .ok_or_else(|| AppError::Auth(format!("Missing or invalid {} header.", USER_ID_HEADER)))?;
  let role = header_str(headers, USER_ROLE_HEADER)
    .and_then(|s| s.parse::<Role>().ok())
    .ok_or_else(|| AppError::Auth(format!("Missing or invalid {} header.", USER_ROLE_HEADER)))?;
  Ok(Principal::new(user_id, role))
}

impl FromRequest for AuthenticatedPrincipal {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(principal_from_headers(req.headers()).map(AuthenticatedPrincipal).map_err(|e| {
      warn!(path = %req.path(), error = %e, "Rejected request without a usable principal.");
      e
    }))
  }
}
