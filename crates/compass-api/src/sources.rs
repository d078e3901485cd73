//! `GET` handlers for `/sources`, which may embed each source's questions.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/sources` | `where`, `include-deleted`, `with-questions` |
//! | `GET`  | `/sources/{id}` | `include-deleted`, `with-questions` |
//!
//! Writes go through the generic handlers in [`crate::resource`].

use std::{collections::HashMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State, rejection::PathRejection},
};
use compass_core::{
  filter::{Condition, Predicate, Scalar},
  lifecycle::LifecycleManager,
  question::Question,
  source::Source,
  store::Repository,
};
use uuid::Uuid;

use crate::{error::ApiError, query::Params, resource::Resource, views::SourceView};

impl Resource for Source {
  type View = SourceView;

  fn view(self) -> SourceView { SourceView { source: self, questions: None } }
}

/// `GET /sources[?where=...][&include-deleted][&with-questions]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<SourceView>>, ApiError>
where
  S: Repository<Source> + Repository<Question>,
{
  let params = Params::from_pairs(pairs)?;
  let sources = LifecycleManager::<Source, S>::new(&store)
    .find_all(params.filter.as_ref(), params.include_deleted)
    .await?;
  if !params.with_questions {
    return Ok(Json(sources.into_iter().map(Resource::view).collect()));
  }
  Ok(Json(with_questions(store.as_ref(), sources).await?))
}

/// `GET /sources/{id}[?include-deleted][&with-questions]`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<Uuid>, PathRejection>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<SourceView>, ApiError>
where
  S: Repository<Source> + Repository<Question>,
{
  let Path(id) = id?;
  let params = Params::from_pairs(pairs)?;
  let source = LifecycleManager::<Source, S>::new(&store)
    .find_one(id, params.include_deleted)
    .await?;
  if !params.with_questions {
    return Ok(Json(source.view()));
  }
  let mut views = with_questions(store.as_ref(), vec![source]).await?;
  views
    .pop()
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("Source with id {id} not found")))
}

/// Attach the live questions of every source in one query.
async fn with_questions<S>(store: &S, sources: Vec<Source>) -> Result<Vec<SourceView>, ApiError>
where
  S: Repository<Source> + Repository<Question>,
{
  if sources.is_empty() {
    return Ok(Vec::new());
  }
  let ids = sources.iter().map(|s| Scalar::Text(s.id.to_string())).collect();
  let predicate = Predicate::Field {
    field:     "sourceId".to_owned(),
    condition: Condition::In(ids),
  };
  let questions = LifecycleManager::<Question, S>::new(store)
    .find_all(Some(&predicate), false)
    .await?;

  let mut by_source: HashMap<Uuid, Vec<Question>> = HashMap::new();
  for question in questions {
    if let Some(source_id) = question.source_id {
      by_source.entry(source_id).or_default().push(question);
    }
  }

  Ok(
    sources
      .into_iter()
      .map(|source| {
        let questions = by_source.remove(&source.id).unwrap_or_default();
        SourceView { source, questions: Some(questions) }
      })
      .collect(),
  )
}
