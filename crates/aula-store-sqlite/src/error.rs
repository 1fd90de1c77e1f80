//! Error type for `aula-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rule rejected the operation (validation, not found).
  #[error(transparent)]
  Core(#[from] aula_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value does not decode into its domain type.
  #[error("decode error: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<tokio_rusqlite::Error> for Error {
  /// Closures passed to `Connection::call` smuggle domain and decode errors
  /// out through [`tokio_rusqlite::Error::Other`]; unwrap them here so they
  /// keep their meaning.
  fn from(e: tokio_rusqlite::Error) -> Self {
    let inner = match e {
      tokio_rusqlite::Error::Other(inner) => inner,
      other => return Error::Database(other),
    };
    let inner = match inner.downcast::<Error>() {
      Ok(store) => return *store,
      Err(inner) => inner,
    };
    match inner.downcast::<aula_core::Error>() {
      Ok(core) => Error::Core(*core),
      Err(inner) => Error::Database(tokio_rusqlite::Error::Other(inner)),
    }
  }
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self { Error::Database(e.into()) }
}

impl From<Error> for aula_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => aula_core::Error::Storage(Box::new(other)),
    }
  }
}

/// Abort a `Connection::call` closure with a domain error.
pub(crate) fn reject(e: aula_core::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

/// Carry a store-level result (e.g. a decode) across a `Connection::call`
/// boundary.
pub(crate) fn lift<T>(result: Result<T>) -> tokio_rusqlite::Result<T> {
  result.map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))
}
