//! Generic CRUD handlers, mounted once per entity.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/<resource>` | Body: JSON array of new rows; returns 201 + rows |
//! | `GET`  | `/<resource>` | `where`, `include-deleted` |
//! | `GET`  | `/<resource>/{key}` | `include-deleted` |
//! | `PUT`/`PATCH` | `/<resource>/{key}` | Body: partial row; `restore` |
//! | `DELETE` | `/<resource>/{key}` | `force`; 204 even if nothing matched |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use compass_core::{
  Error,
  answer::Answer,
  entity::Entity,
  lifecycle::{LifecycleManager, RemoveOptions, UpdateOptions},
  party::Party,
  question::Question,
  result::QuizResult,
  store::Repository,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{error::ApiError, query::Params, views::ResultView};

/// An [`Entity`] exposed over HTTP.
pub trait Resource:
  Entity<Key: DeserializeOwned, New: DeserializeOwned, Patch: DeserializeOwned>
{
  /// Response shape of one row.
  type View: Serialize + Send;

  fn view(self) -> Self::View;
}

impl Resource for Question {
  type View = Question;

  fn view(self) -> Question { self }
}

impl Resource for Party {
  type View = Party;

  fn view(self) -> Party { self }
}

impl Resource for Answer {
  type View = Answer;

  fn view(self) -> Answer { self }
}

impl Resource for QuizResult {
  type View = ResultView;

  fn view(self) -> ResultView { ResultView::from(self) }
}

fn views<E: Resource>(rows: Vec<E>) -> Vec<E::View> {
  rows.into_iter().map(Resource::view).collect()
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /<resource>`: body: `[{...}, ...]`
pub async fn create<E, S>(
  State(store): State<Arc<S>>,
  body: Result<Json<Vec<E::New>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  E: Resource,
  S: Repository<E>,
{
  let Json(records) = body?;
  let rows = LifecycleManager::<E, S>::new(&store).create(records).await?;
  Ok((StatusCode::CREATED, Json(views(rows))))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /<resource>[?where=...][&include-deleted]`
pub async fn list<E, S>(
  State(store): State<Arc<S>>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<E::View>>, ApiError>
where
  E: Resource,
  S: Repository<E>,
{
  let params = Params::from_pairs(pairs)?;
  let rows = LifecycleManager::<E, S>::new(&store)
    .find_all(params.filter.as_ref(), params.include_deleted)
    .await?;
  Ok(Json(views(rows)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /<resource>/{key}[?include-deleted]`
pub async fn get_one<E, S>(
  State(store): State<Arc<S>>,
  key: Result<Path<E::Key>, PathRejection>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<E::View>, ApiError>
where
  E: Resource,
  S: Repository<E>,
{
  let Path(key) = key?;
  let params = Params::from_pairs(pairs)?;
  let row = LifecycleManager::<E, S>::new(&store)
    .find_one(key, params.include_deleted)
    .await?;
  Ok(Json(row.view()))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT|PATCH /<resource>/{key}[?restore]`: body: partial row
pub async fn update<E, S>(
  State(store): State<Arc<S>>,
  key: Result<Path<E::Key>, PathRejection>,
  Query(pairs): Query<Vec<(String, String)>>,
  body: Result<Json<E::Patch>, JsonRejection>,
) -> Result<Json<E::View>, ApiError>
where
  E: Resource,
  S: Repository<E>,
{
  let Path(key) = key?;
  let Json(patch) = body?;
  let params = Params::from_pairs(pairs)?;
  let row = LifecycleManager::<E, S>::new(&store)
    .update(key, patch, UpdateOptions { restore: params.restore })
    .await?;
  Ok(Json(row.view()))
}

// ─── Remove ──────────────────────────────────────────────────────────────────

/// `DELETE /<resource>/{key}[?force]`
///
/// Deleting something that is not there counts as success.
pub async fn remove<E, S>(
  State(store): State<Arc<S>>,
  key: Result<Path<E::Key>, PathRejection>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Result<StatusCode, ApiError>
where
  E: Resource,
  S: Repository<E>,
{
  let Path(key) = key?;
  let params = Params::from_pairs(pairs)?;
  match LifecycleManager::<E, S>::new(&store)
    .remove(key, RemoveOptions { force: params.force })
    .await
  {
    Ok(()) | Err(Error::NotFound { .. }) => Ok(StatusCode::NO_CONTENT),
    Err(err) => Err(err.into()),
  }
}
