//! The [`Entity`] capability trait shared by every persisted type.
//!
//! The lifecycle manager is written once against this trait. Each entity
//! declares its key shape, its creation and patch payloads, the fields a
//! filter may reference, the kinds of rows that block its deletion, and how
//! its unique name-like fields are tombstoned on soft delete.

use std::fmt::{Debug, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Bookkeeping columns carried by every row; all are set by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  /// `Some` while the row is soft-deleted.
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Timestamps {
  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }
}

// ─── Capability trait ────────────────────────────────────────────────────────

/// A persisted row type managed by [`crate::lifecycle::LifecycleManager`].
pub trait Entity: Clone + Debug + Send + Sync + 'static {
  /// Single UUID or a composite key.
  type Key: Copy + Debug + Display + PartialEq + Send + Sync + 'static;
  /// Payload accepted by bulk creation.
  type New: Debug + Send + Sync + 'static;
  /// Partial update; `None` fields are left untouched.
  type Patch: Debug + Default + Send + Sync + 'static;

  /// Human-readable kind, used in error messages and logs.
  const KIND: &'static str;

  /// Field names a filter predicate may reference (API spelling).
  const FIELDS: &'static [&'static str];

  /// Kinds of child rows whose live presence blocks deletion.
  const DEPENDENTS: &'static [&'static str] = &[];

  fn key(&self) -> Self::Key;

  fn timestamps(&self) -> &Timestamps;

  fn validate_new(_new: &Self::New) -> Result<()> { Ok(()) }

  fn validate_patch(_patch: &Self::Patch) -> Result<()> { Ok(()) }

  /// Patch applied right before a soft delete so unique values are freed.
  fn tombstone_patch(&self) -> Option<Self::Patch> { None }

  /// Patch that reverses [`Entity::tombstone_patch`] on restore.
  fn revive_patch(&self) -> Option<Self::Patch> { None }
}

// ─── Tombstone naming ────────────────────────────────────────────────────────

/// Rewrite `original` to `"<original> (deleted)_<key>"`.
pub fn tombstone(original: &str, key: impl Display) -> String {
  format!("{original} (deleted)_{key}")
}

/// Recover the original value from a tombstoned one. Returns `None` when
/// `value` does not carry the suffix for `key`.
pub fn untombstone(value: &str, key: impl Display) -> Option<&str> {
  value.strip_suffix(&format!(" (deleted)_{key}"))
}

// ─── Validation helpers ──────────────────────────────────────────────────────

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(crate::Error::validation(format!("{field} must not be empty")));
  }
  Ok(())
}

pub(crate) fn require_range(field: &str, value: u8, min: u8, max: u8) -> Result<()> {
  if !(min..=max).contains(&value) {
    return Err(crate::Error::validation(format!(
      "{field} must be between {min} and {max}, got {value}"
    )));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn tombstone_roundtrips_through_untombstone() {
    let id = Uuid::new_v4();
    let dead = tombstone("Greens", id);
    assert_eq!(dead, format!("Greens (deleted)_{id}"));
    assert_eq!(untombstone(&dead, id), Some("Greens"));
  }

  #[test]
  fn untombstone_ignores_foreign_suffix() {
    let id = Uuid::new_v4();
    let dead = tombstone("Greens", Uuid::new_v4());
    assert_eq!(untombstone(&dead, id), None);
    assert_eq!(untombstone("Greens", id), None);
  }

  #[test]
  fn nested_tombstones_peel_one_layer() {
    let id = Uuid::new_v4();
    let twice = tombstone(&tombstone("x", id), id);
    assert_eq!(untombstone(&twice, id), Some(tombstone("x", id).as_str()));
  }
}
