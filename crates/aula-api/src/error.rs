//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Validation failures are form errors: they answer `200 OK` with an
//! `{"error": …}` body so a client can show the message next to the form.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("{0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<aula_core::Error> for ApiError {
  fn from(e: aula_core::Error) -> Self {
    use aula_core::Error as E;
    match e {
      E::Validation(m) => ApiError::Validation(m),
      E::Forbidden(m) => ApiError::Forbidden(m),
      e @ E::NotFound { .. } => ApiError::NotFound(e.to_string()),
      E::Storage(inner) => ApiError::Store(inner),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    tracing::debug!(error = %rejection, "rejected request body");
    ApiError::Validation(rejection.body_text())
  }
}

/// Map any backend error into an [`ApiError`] through the domain taxonomy.
pub fn store_err<E: Into<aula_core::Error>>(e: E) -> ApiError {
  ApiError::from(e.into())
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "authentication required" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"aula\""),
        );
        return res;
      }
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Validation(m) => (StatusCode::OK, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "storage failure");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "internal server error".to_owned(),
        )
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
