//! Result submission: score a user's answers against every party and,
//! unless told otherwise, persist the submission.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Result,
  answer::Answer,
  entity::Entity,
  lifecycle::LifecycleManager,
  party::Party,
  question::Question,
  result::{NewQuizResult, QuizResult, ResultAnswer},
  scoring::agreement_percentage,
  store::Repository,
};

/// Agreement between one submission and one party.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyScore {
  pub party_id:   Uuid,
  pub percentage: f64,
}

/// Scores for one submission, plus the stored row when it was saved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
  pub result: Option<QuizResult>,
  pub scores: Vec<PartyScore>,
}

/// A live party and its live answers on live questions.
#[derive(Debug, Clone)]
pub struct PartyStances {
  pub party_id: Uuid,
  pub answers:  Vec<Answer>,
}

/// Score `submissions` against every live party. With `save`, the
/// submissions are bulk-created first and returned alongside their scores.
pub async fn submit<R>(
  repo: &R,
  submissions: Vec<NewQuizResult>,
  save: bool,
) -> Result<Vec<Scorecard>>
where
  R: Repository<Party>
    + Repository<Question>
    + Repository<Answer>
    + Repository<QuizResult>,
{
  for submission in &submissions {
    QuizResult::validate_new(submission)?;
  }

  let stances = load_stances(repo).await?;
  let answer_sets: Vec<Vec<ResultAnswer>> =
    submissions.iter().map(|s| s.answers.clone()).collect();

  let stored: Vec<Option<QuizResult>> = if save {
    LifecycleManager::<QuizResult, R>::new(repo)
      .create(submissions)
      .await?
      .into_iter()
      .map(Some)
      .collect()
  } else {
    vec![None; answer_sets.len()]
  };

  Ok(
    answer_sets
      .iter()
      .zip(stored)
      .map(|(answers, result)| Scorecard {
        result,
        scores: score_parties(&stances, answers),
      })
      .collect(),
  )
}

/// Fetch every live party with the answers that count toward its score.
pub async fn load_stances<R>(repo: &R) -> Result<Vec<PartyStances>>
where
  R: Repository<Party> + Repository<Question> + Repository<Answer>,
{
  let parties = LifecycleManager::<Party, R>::new(repo)
    .find_all(None, false)
    .await?;
  let live_questions: HashSet<Uuid> = LifecycleManager::<Question, R>::new(repo)
    .find_all(None, false)
    .await?
    .into_iter()
    .map(|q| q.id)
    .collect();
  let answers = LifecycleManager::<Answer, R>::new(repo)
    .find_all(None, false)
    .await?;

  let mut by_party: HashMap<Uuid, Vec<Answer>> = HashMap::new();
  for answer in answers {
    if live_questions.contains(&answer.question_id) {
      by_party.entry(answer.party_id).or_default().push(answer);
    }
  }

  Ok(
    parties
      .into_iter()
      .map(|party| PartyStances {
        party_id: party.id,
        answers:  by_party.remove(&party.id).unwrap_or_default(),
      })
      .collect(),
  )
}

/// One [`PartyScore`] per party, in the order given.
pub fn score_parties(stances: &[PartyStances], answers: &[ResultAnswer]) -> Vec<PartyScore> {
  stances
    .iter()
    .map(|stance| PartyScore {
      party_id:   stance.party_id,
      percentage: agreement_percentage(&stance.answers, answers),
    })
    .collect()
}
