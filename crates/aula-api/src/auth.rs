//! HTTP Basic authentication against the user table.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

use aula_core::{
  access::{Actor, Operation},
  people::User,
  store::AcademicStore,
};

use crate::{
  AppState,
  error::{ApiError, store_err},
  password::verify_password,
};

/// The authenticated, active user behind a request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
  pub fn actor(&self) -> Actor { self.0.actor() }

  /// Fail with 403 unless the user's role permits `operation`.
  pub fn authorize(&self, operation: Operation) -> Result<(), ApiError> {
    self.actor().authorize(operation).map_err(ApiError::from)
  }
}

/// Decode `Authorization: Basic …` into `(username, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let encoded = value.strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (username, password) = creds.split_once(':')?;
  Some((username.to_owned(), password.to_owned()))
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: AcademicStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (username, password) =
      basic_credentials(&parts.headers).ok_or(ApiError::Unauthorized)?;

    let Some(creds) = state
      .store
      .find_credentials(&username)
      .await
      .map_err(store_err)?
    else {
      tracing::warn!(%username, "authentication failed: unknown user");
      return Err(ApiError::Unauthorized);
    };

    if !verify_password(&password, &creds.password_hash) {
      tracing::warn!(%username, "authentication failed: wrong password");
      return Err(ApiError::Unauthorized);
    }
    if !creds.user.is_active {
      tracing::warn!(%username, "authentication failed: inactive user");
      return Err(ApiError::Unauthorized);
    }
    Ok(CurrentUser(creds.user))
  }
}
