//! The [`Repository`] trait consumed by the lifecycle manager.
//!
//! The trait is implemented by storage backends (e.g. `compass-store-sqlite`)
//! once per entity type. Backends report their failures through
//! [`StoreError`] so uniqueness and referential violations can be told apart
//! from everything else.

use std::future::Future;

use crate::{entity::Entity, filter::Predicate};

// ─── Error classification ────────────────────────────────────────────────────

/// What kind of constraint, if any, a storage failure represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
  UniqueViolation,
  ForeignKeyViolation,
  /// CHECK / NOT NULL and similar column constraints.
  ConstraintViolation,
  Other,
}

pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn classify(&self) -> StoreFailure;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Persistence for one entity type `E`.
///
/// Unless a method says otherwise, `include_deleted = false` hides
/// soft-deleted rows. Write methods address rows by key regardless of their
/// deletion state; visibility checks are the caller's job.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Repository<E: Entity>: Send + Sync {
  type Error: StoreError;

  /// Insert all records atomically and return them in input order.
  fn bulk_create(
    &self,
    records: Vec<E::New>,
  ) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + '_;

  /// Rows matching `predicate` (all rows if `None`), in insertion order.
  fn find_all<'a>(
    &'a self,
    predicate: Option<&'a Predicate>,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + 'a;

  fn find_one(
    &self,
    key: E::Key,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// Apply `patch` and bump `updated_at`. Returns `None` if the row is gone.
  fn update_row(
    &self,
    key: E::Key,
    patch: E::Patch,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// Set `deleted_at`. Returns `false` if no live row matched.
  fn soft_delete(
    &self,
    key: E::Key,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Clear `deleted_at`. Returns `None` if the row is gone.
  fn restore(
    &self,
    key: E::Key,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// Remove the row for good. Returns `false` if nothing was removed.
  fn hard_delete(
    &self,
    key: E::Key,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Number of live rows of the kinds in [`Entity::DEPENDENTS`] that
  /// reference `key`.
  fn count_live_dependents(
    &self,
    key: E::Key,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_ {
    let _ = key;
    async { Ok::<u64, Self::Error>(0) }
  }
}
