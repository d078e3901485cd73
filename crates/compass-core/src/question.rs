//! Question: one statement of the quiz, placed on the compass.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{
  Result,
  entity::{Entity, Timestamps, require_non_empty, tombstone, untombstone},
};

/// The compass zone a positive answer to the question points toward.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Position {
  TopLeft,
  Top,
  TopRight,
  Left,
  Center,
  Right,
  BottomLeft,
  Bottom,
  BottomRight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id:         Uuid,
  /// Unique among live rows.
  pub title:      String,
  pub subtitle:   Option<String>,
  pub position:   Position,
  /// Part of the core set a user must answer before exiting early.
  pub is_primary: bool,
  /// `None` only once the owning source has been hard-deleted.
  pub source_id:  Option<Uuid>,
  #[serde(flatten)]
  pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
  pub title:      String,
  pub subtitle:   Option<String>,
  pub position:   Position,
  #[serde(default)]
  pub is_primary: bool,
  pub source_id:  Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPatch {
  pub title:      Option<String>,
  pub subtitle:   Option<String>,
  pub position:   Option<Position>,
  pub is_primary: Option<bool>,
  pub source_id:  Option<Uuid>,
}

impl Entity for Question {
  type Key = Uuid;
  type New = NewQuestion;
  type Patch = QuestionPatch;

  const KIND: &'static str = "Question";
  const FIELDS: &'static [&'static str] = &[
    "id",
    "title",
    "subtitle",
    "position",
    "isPrimary",
    "sourceId",
    "createdAt",
    "updatedAt",
    "deletedAt",
  ];

  fn key(&self) -> Uuid { self.id }

  fn timestamps(&self) -> &Timestamps { &self.timestamps }

  fn validate_new(new: &NewQuestion) -> Result<()> {
    require_non_empty("title", &new.title)
  }

  fn validate_patch(patch: &QuestionPatch) -> Result<()> {
    match &patch.title {
      Some(title) => require_non_empty("title", title),
      None => Ok(()),
    }
  }

  fn tombstone_patch(&self) -> Option<QuestionPatch> {
    Some(QuestionPatch {
      title: Some(tombstone(&self.title, self.id)),
      ..Default::default()
    })
  }

  fn revive_patch(&self) -> Option<QuestionPatch> {
    untombstone(&self.title, self.id).map(|title| QuestionPatch {
      title: Some(title.to_owned()),
      ..Default::default()
    })
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn positions_use_kebab_case_labels() {
    let labels: Vec<String> = Position::iter().map(|p| p.to_string()).collect();
    assert_eq!(labels.len(), 9);
    assert!(labels.contains(&"center".to_owned()));
    assert!(labels.contains(&"bottom-right".to_owned()));
    assert_eq!(Position::from_str("top-left").unwrap(), Position::TopLeft);
    assert_eq!(
      serde_json::to_string(&Position::BottomLeft).unwrap(),
      "\"bottom-left\""
    );
  }

  #[test]
  fn blank_title_is_rejected() {
    let new = NewQuestion {
      title:      "   ".into(),
      subtitle:   None,
      position:   Position::Center,
      is_primary: true,
      source_id:  Uuid::new_v4(),
    };
    assert!(matches!(
      Question::validate_new(&new),
      Err(crate::Error::Validation(_))
    ));
  }
}
