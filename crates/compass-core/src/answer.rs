//! Answer: a party's canonical stance on one question.
//!
//! Identified by the `(question, party)` pair; at most one answer exists per
//! pair.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  entity::{Entity, Timestamps, require_range},
  scoring::Stance,
};

/// Lowest and highest agree level a party may hold (1 = fully agree).
pub const PARTY_AGREE_RANGE: (u8, u8) = (1, 5);

/// Composite key. Field names match the `{question_id}/{party_id}` route
/// segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnswerKey {
  pub question_id: Uuid,
  pub party_id:    Uuid,
}

impl fmt::Display for AnswerKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.question_id, self.party_id)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
  pub question_id: Uuid,
  pub party_id:    Uuid,
  pub agree_level: u8,
  pub statement:   Option<String>,
  /// Citation backing the stance.
  pub source:      Option<String>,
  #[serde(flatten)]
  pub timestamps:  Timestamps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnswer {
  pub question_id: Uuid,
  pub party_id:    Uuid,
  pub agree_level: u8,
  pub statement:   Option<String>,
  pub source:      Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPatch {
  pub agree_level: Option<u8>,
  pub statement:   Option<String>,
  pub source:      Option<String>,
}

impl Stance for Answer {
  fn question_id(&self) -> Uuid { self.question_id }

  fn agree_level(&self) -> u8 { self.agree_level }
}

impl Entity for Answer {
  type Key = AnswerKey;
  type New = NewAnswer;
  type Patch = AnswerPatch;

  const KIND: &'static str = "Answer";
  const FIELDS: &'static [&'static str] = &[
    "questionId",
    "partyId",
    "agreeLevel",
    "statement",
    "source",
    "createdAt",
    "updatedAt",
    "deletedAt",
  ];

  fn key(&self) -> AnswerKey {
    AnswerKey { question_id: self.question_id, party_id: self.party_id }
  }

  fn timestamps(&self) -> &Timestamps { &self.timestamps }

  fn validate_new(new: &NewAnswer) -> Result<()> {
    let (min, max) = PARTY_AGREE_RANGE;
    require_range("agreeLevel", new.agree_level, min, max)
  }

  fn validate_patch(patch: &AnswerPatch) -> Result<()> {
    let (min, max) = PARTY_AGREE_RANGE;
    match patch.agree_level {
      Some(level) => require_range("agreeLevel", level, min, max),
      None => Ok(()),
    }
  }
}
