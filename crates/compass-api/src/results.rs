//! `POST /results`: score submissions and, unless `no-save`, store them.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use compass_core::{
  answer::Answer,
  party::Party,
  question::Question,
  quiz,
  result::{NewQuizResult, QuizResult},
  store::Repository,
};

use crate::{error::ApiError, query::Params, views::ScorecardView};

/// `POST /results[?no-save]`: body: `[{ "answers": [...], "ipAddress": ..., ... }]`
///
/// Returns one `{ result, scores }` card per submission; `result` is `null`
/// when nothing was stored.
pub async fn submit<S>(
  State(store): State<Arc<S>>,
  Query(pairs): Query<Vec<(String, String)>>,
  body: Result<Json<Vec<NewQuizResult>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Repository<Party> + Repository<Question> + Repository<Answer> + Repository<QuizResult>,
{
  let Json(submissions) = body?;
  let params = Params::from_pairs(pairs)?;
  let cards = quiz::submit(store.as_ref(), submissions, !params.no_save).await?;
  let status = if params.no_save { StatusCode::OK } else { StatusCode::CREATED };
  Ok((status, Json(cards.into_iter().map(ScorecardView::from).collect::<Vec<_>>())))
}
