//! Error types for `aula-core`.
//!
//! Every backend and every HTTP layer speaks this taxonomy. Backends keep
//! their own error enums but must be convertible into [`Error`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Bad input or a violated business rule. Recoverable; shown to the user
  /// as a form error.
  #[error("{0}")]
  Validation(String),

  /// The actor's role (or assignment) does not permit the operation.
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("{kind} not found: {id}")]
  NotFound { kind: &'static str, id: String },

  /// Any persistence failure. Fatal to the request.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn forbidden(message: impl Into<String>) -> Self {
    Self::Forbidden(message.into())
  }

  pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
    Self::NotFound { kind, id: id.to_string() }
  }

  pub fn is_validation(&self) -> bool { matches!(self, Self::Validation(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
