//! Error type for `compass-store-sqlite`.

use compass_core::store::{StoreError, StoreFailure};
use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A predicate named a field with no backing column.
  #[error("no column for field {0:?}")]
  UnknownField(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  fn classify(&self) -> StoreFailure {
    let Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(failure, _),
    )) = self
    else {
      return StoreFailure::Other;
    };
    if failure.code != ErrorCode::ConstraintViolation {
      return StoreFailure::Other;
    }
    match failure.extended_code {
      ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
        StoreFailure::UniqueViolation
      }
      ffi::SQLITE_CONSTRAINT_FOREIGNKEY => StoreFailure::ForeignKeyViolation,
      _ => StoreFailure::ConstraintViolation,
    }
  }
}
