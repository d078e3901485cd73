//! Quiz result: one completed user submission.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Result,
  entity::{Entity, Timestamps, require_non_empty, require_range},
  scoring::{DONT_KNOW, Stance},
};

/// Highest agree level a user may give; `0` means "don't know".
pub const USER_MAX_AGREE: u8 = 5;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
  Other,
}

/// A user's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultAnswer {
  pub question_id: Uuid,
  pub agree_level: u8,
}

impl Stance for ResultAnswer {
  fn question_id(&self) -> Uuid { self.question_id }

  fn agree_level(&self) -> u8 { self.agree_level }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
  pub id:          Uuid,
  /// In the order the user answered.
  pub answers:     Vec<ResultAnswer>,
  pub ip_address:  String,
  pub fingerprint: String,
  pub zip_code:    Option<u32>,
  pub gender:      Option<Gender>,
  pub birth_year:  Option<i32>,
  #[serde(flatten)]
  pub timestamps:  Timestamps,
}

impl QuizResult {
  /// Age derived from `birth_year` relative to `current_year`.
  pub fn age_in(&self, current_year: i32) -> Option<i32> {
    self.birth_year.map(|year| current_year - year)
  }

  /// Age as of today; never stored.
  pub fn age(&self) -> Option<i32> { self.age_in(Utc::now().year()) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuizResult {
  pub answers:     Vec<ResultAnswer>,
  pub ip_address:  String,
  pub fingerprint: String,
  pub zip_code:    Option<u32>,
  pub gender:      Option<Gender>,
  pub birth_year:  Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultPatch {
  pub answers:    Option<Vec<ResultAnswer>>,
  pub zip_code:   Option<u32>,
  pub gender:     Option<Gender>,
  pub birth_year: Option<i32>,
}

fn validate_answers(answers: &[ResultAnswer]) -> Result<()> {
  for answer in answers {
    require_range("agreeLevel", answer.agree_level, DONT_KNOW, USER_MAX_AGREE)?;
  }
  Ok(())
}

impl Entity for QuizResult {
  type Key = Uuid;
  type New = NewQuizResult;
  type Patch = QuizResultPatch;

  const KIND: &'static str = "Result";
  const FIELDS: &'static [&'static str] = &[
    "id",
    "ipAddress",
    "fingerprint",
    "zipCode",
    "gender",
    "birthYear",
    "createdAt",
    "updatedAt",
    "deletedAt",
  ];

  fn key(&self) -> Uuid { self.id }

  fn timestamps(&self) -> &Timestamps { &self.timestamps }

  fn validate_new(new: &NewQuizResult) -> Result<()> {
    require_non_empty("ipAddress", &new.ip_address)?;
    require_non_empty("fingerprint", &new.fingerprint)?;
    validate_answers(&new.answers)
  }

  fn validate_patch(patch: &QuizResultPatch) -> Result<()> {
    match &patch.answers {
      Some(answers) => validate_answers(answers),
      None => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, Utc};

  use super::*;

  fn result(birth_year: Option<i32>) -> QuizResult {
    let now: DateTime<Utc> = Utc::now();
    QuizResult {
      id: Uuid::new_v4(),
      answers: vec![],
      ip_address: "127.0.0.1".into(),
      fingerprint: "fp".into(),
      zip_code: None,
      gender: None,
      birth_year,
      timestamps: Timestamps { created_at: now, updated_at: now, deleted_at: None },
    }
  }

  #[test]
  fn age_is_derived_from_birth_year() {
    assert_eq!(result(Some(1990)).age_in(2024), Some(34));
    assert_eq!(result(None).age_in(2024), None);
  }

  #[test]
  fn user_agree_level_allows_dont_know_but_not_six() {
    let mut new = NewQuizResult {
      answers:     vec![ResultAnswer { question_id: Uuid::new_v4(), agree_level: 0 }],
      ip_address:  "10.0.0.1".into(),
      fingerprint: "abc".into(),
      zip_code:    Some(11000),
      gender:      Some(Gender::Other),
      birth_year:  Some(2000),
    };
    assert!(QuizResult::validate_new(&new).is_ok());
    new.answers[0].agree_level = 6;
    assert!(QuizResult::validate_new(&new).is_err());
  }
}
