//! The resource lifecycle manager: CRUD with soft delete, restore, and
//! force delete, written once for every [`Entity`].
//!
//! State machine per row:
//!
//! ```text
//!   ∅ ──create──▶ Active ──remove──▶ SoftDeleted ──update{restore}──▶ Active
//!                   │                     │
//!                   └──remove{force}──▶ Gone ◀──remove{force}──┘
//! ```
//!
//! Any transition out of a state the row is not in fails with
//! [`Error::NotFound`]. Storage failures are classified exactly once, see
//! [`classify`].

use std::marker::PhantomData;

use crate::{
  Error, Result,
  entity::Entity,
  filter::Predicate,
  store::{Repository, StoreError, StoreFailure},
};

/// Options for [`LifecycleManager::update`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
  /// Also look at soft-deleted rows, and bring the row back to life.
  pub restore: bool,
}

/// Options for [`LifecycleManager::remove`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
  /// Remove the row for good, even if it is already soft-deleted.
  pub force: bool,
}

/// Lifecycle operations for entity `E` over repository `R`.
pub struct LifecycleManager<'r, E, R> {
  repo:    &'r R,
  _entity: PhantomData<fn() -> E>,
}

impl<'r, E, R> LifecycleManager<'r, E, R>
where
  E: Entity,
  R: Repository<E>,
{
  pub fn new(repo: &'r R) -> Self { Self { repo, _entity: PhantomData } }

  /// Validate and bulk-insert `records`.
  pub async fn create(&self, records: Vec<E::New>) -> Result<Vec<E>> {
    for record in &records {
      E::validate_new(record)?;
    }
    tracing::debug!(kind = E::KIND, count = records.len(), "creating rows");
    self.repo.bulk_create(records).await.map_err(classify)
  }

  pub async fn find_all(
    &self,
    filter: Option<&Predicate>,
    include_deleted: bool,
  ) -> Result<Vec<E>> {
    if let Some(predicate) = filter {
      predicate.check_fields(E::FIELDS)?;
      tracing::debug!(kind = E::KIND, ?predicate, "filtering rows");
    }
    self
      .repo
      .find_all(filter, include_deleted)
      .await
      .map_err(classify)
  }

  pub async fn find_one(&self, key: E::Key, include_deleted: bool) -> Result<E> {
    self
      .repo
      .find_one(key, include_deleted)
      .await
      .map_err(classify)?
      .ok_or_else(|| Error::not_found(E::KIND, key))
  }

  /// Apply `patch` to a live row, or with `restore` to any row, which is
  /// then un-deleted and has its tombstoned names reverted.
  pub async fn update(
    &self,
    key: E::Key,
    patch: E::Patch,
    opts: UpdateOptions,
  ) -> Result<E> {
    E::validate_patch(&patch)?;
    let current = self.find_one(key, opts.restore).await?;

    let mut row = self.apply(key, patch).await?;

    if opts.restore && current.timestamps().is_deleted() {
      if let Some(revive) = row.revive_patch() {
        self.apply(key, revive).await?;
      }
      row = self
        .repo
        .restore(key)
        .await
        .map_err(classify)?
        .ok_or_else(|| Error::not_found(E::KIND, key))?;
      tracing::debug!(kind = E::KIND, %key, "restored row");
    }

    Ok(row)
  }

  /// Soft-delete a live row, or with `force` hard-delete any row.
  ///
  /// Rows with live dependents cannot be removed either way.
  pub async fn remove(&self, key: E::Key, opts: RemoveOptions) -> Result<()> {
    let row = self.find_one(key, opts.force).await?;

    if !E::DEPENDENTS.is_empty() {
      let live = self
        .repo
        .count_live_dependents(key)
        .await
        .map_err(classify)?;
      if live > 0 {
        return Err(Error::validation(format!(
          "{} {key} is still referenced by {live} live {}",
          E::KIND,
          E::DEPENDENTS.join("/"),
        )));
      }
    }

    let removed = if opts.force {
      self.repo.hard_delete(key).await.map_err(classify)?
    } else {
      if let Some(tombstone) = row.tombstone_patch() {
        self.apply(key, tombstone).await?;
      }
      self.repo.soft_delete(key).await.map_err(classify)?
    };

    if !removed {
      return Err(Error::not_found(E::KIND, key));
    }
    tracing::debug!(kind = E::KIND, %key, force = opts.force, "removed row");
    Ok(())
  }

  async fn apply(&self, key: E::Key, patch: E::Patch) -> Result<E> {
    self
      .repo
      .update_row(key, patch)
      .await
      .map_err(classify)?
      .ok_or_else(|| Error::not_found(E::KIND, key))
  }
}

/// Map a storage failure onto the error taxonomy.
pub fn classify<S: StoreError>(err: S) -> Error {
  match err.classify() {
    StoreFailure::UniqueViolation => Error::Conflict(err.to_string()),
    StoreFailure::ForeignKeyViolation | StoreFailure::ConstraintViolation => {
      Error::Validation(err.to_string())
    }
    StoreFailure::Other => Error::Store(Box::new(err)),
  }
}
