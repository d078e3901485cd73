//! Error types for `compass-core`.
//!
//! Every failure surfaced by the lifecycle manager, the filter parser, and
//! the quiz flow is one of these variants. Storage errors are classified
//! once (see [`crate::store::StoreError`]) and otherwise carried opaquely.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The key does not resolve to a visible row.
  #[error("{kind} with id {key} not found")]
  NotFound { kind: &'static str, key: String },

  /// A uniqueness constraint rejected the write.
  #[error("conflict: {0}")]
  Conflict(String),

  /// The payload or a referential guard rejected the operation.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("bad filter: {0}")]
  BadFilter(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn not_found(kind: &'static str, key: impl std::fmt::Display) -> Self {
    Self::NotFound { kind, key: key.to_string() }
  }

  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn bad_filter(message: impl Into<String>) -> Self {
    Self::BadFilter(message.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
