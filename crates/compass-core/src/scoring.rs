//! Agreement scoring between a user's answers and a party's stances.
//!
//! Pure functions only: no I/O, inputs are never mutated.

use uuid::Uuid;

/// User agree level meaning "don't know"; such answers are not scored.
pub const DONT_KNOW: u8 = 0;

/// Percentage points lost per step of disagreement (4 steps span 100%).
const POINTS_PER_STEP: f64 = 25.0;

/// Anything that states an agree level on a question.
pub trait Stance {
  fn question_id(&self) -> Uuid;
  fn agree_level(&self) -> u8;
}

/// Compute how closely `user` agrees with `party`, from 0 to 100, rounded to
/// two decimals.
///
/// Each party stance is paired with the first user answer on the same
/// question. Pairs without a user answer, or where the user answered
/// [`DONT_KNOW`], are skipped. With no scored pairs the result is `0`.
pub fn agreement_percentage<P, U>(party: &[P], user: &[U]) -> f64
where
  P: Stance,
  U: Stance,
{
  let disagreements: Vec<u8> = party
    .iter()
    .filter_map(|stance| {
      let answer = user
        .iter()
        .find(|a| a.question_id() == stance.question_id())?;
      if answer.agree_level() == DONT_KNOW {
        return None;
      }
      Some(stance.agree_level().abs_diff(answer.agree_level()))
    })
    .collect();

  if disagreements.is_empty() {
    return 0.0;
  }

  let total: f64 = disagreements.iter().map(|d| f64::from(*d)).sum();
  let mean = total / disagreements.len() as f64;
  ((100.0 - mean * POINTS_PER_STEP) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Clone, Copy)]
  struct S(Uuid, u8);

  impl Stance for S {
    fn question_id(&self) -> Uuid { self.0 }

    fn agree_level(&self) -> u8 { self.1 }
  }

  #[test]
  fn empty_party_answers_score_zero() {
    let q = Uuid::new_v4();
    assert_eq!(agreement_percentage::<S, S>(&[], &[S(q, 3)]), 0.0);
  }

  #[test]
  fn identical_answers_score_hundred() {
    let (q1, q2) = (Uuid::new_v4(), Uuid::new_v4());
    let party = [S(q1, 2), S(q2, 5)];
    let user = [S(q2, 5), S(q1, 2)];
    assert_eq!(agreement_percentage(&party, &user), 100.0);
  }

  #[test]
  fn opposite_answers_score_zero() {
    let (q1, q2) = (Uuid::new_v4(), Uuid::new_v4());
    let party = [S(q1, 1), S(q2, 5)];
    let user = [S(q1, 5), S(q2, 1)];
    assert_eq!(agreement_percentage(&party, &user), 0.0);
  }

  #[test]
  fn mixed_disagreement_averages() {
    let (q1, q2) = (Uuid::new_v4(), Uuid::new_v4());
    let party = [S(q1, 5), S(q2, 1)];
    let user = [S(q1, 5), S(q2, 3)];
    assert_eq!(agreement_percentage(&party, &user), 75.0);
  }

  #[test]
  fn dont_know_and_unmatched_are_ignored() {
    let (q1, q2, q3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let party = [S(q1, 4), S(q2, 1), S(q3, 5)];
    let user = [S(q1, 4), S(q2, DONT_KNOW)];
    assert_eq!(agreement_percentage(&party, &user), 100.0);
  }

  #[test]
  fn all_dont_know_scores_zero() {
    let q = Uuid::new_v4();
    assert_eq!(agreement_percentage(&[S(q, 3)], &[S(q, DONT_KNOW)]), 0.0);
  }

  #[test]
  fn rounds_to_two_decimals() {
    let (q1, q2, q3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let party = [S(q1, 1), S(q2, 1), S(q3, 1)];
    let user = [S(q1, 2), S(q2, 1), S(q3, 1)];
    // mean disagreement 1/3 -> 91.666..
    assert_eq!(agreement_percentage(&party, &user), 91.67);
  }
}
