//! Response shapes that add derived fields to stored rows.

use compass_core::{
  question::Question,
  quiz::{PartyScore, Scorecard},
  result::QuizResult,
  source::Source,
};
use serde::Serialize;

/// A result row plus the submitter's age, derived from `birthYear`.
#[derive(Debug, Serialize)]
pub struct ResultView {
  #[serde(flatten)]
  pub result: QuizResult,
  pub age:    Option<i32>,
}

impl From<QuizResult> for ResultView {
  fn from(result: QuizResult) -> Self {
    let age = result.age();
    Self { result, age }
  }
}

/// A source, optionally with its live questions embedded.
#[derive(Debug, Serialize)]
pub struct SourceView {
  #[serde(flatten)]
  pub source:    Source,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub questions: Option<Vec<Question>>,
}

#[derive(Debug, Serialize)]
pub struct ScorecardView {
  pub result: Option<ResultView>,
  pub scores: Vec<PartyScore>,
}

impl From<Scorecard> for ScorecardView {
  fn from(card: Scorecard) -> Self {
    Self { result: card.result.map(ResultView::from), scores: card.scores }
  }
}
