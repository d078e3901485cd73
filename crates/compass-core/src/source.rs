//! Source: the publication a question was drawn from.
//!
//! A source exclusively owns its questions. It cannot be deleted, softly or
//! by force, while any non-deleted question still references it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  entity::{Entity, Timestamps, require_non_empty, tombstone, untombstone},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
  pub id:         Uuid,
  /// Unique among live rows.
  pub name:       String,
  #[serde(flatten)]
  pub timestamps: Timestamps,
}

/// Input to bulk creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSource {
  pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePatch {
  pub name: Option<String>,
}

impl Entity for Source {
  type Key = Uuid;
  type New = NewSource;
  type Patch = SourcePatch;

  const KIND: &'static str = "Source";
  const FIELDS: &'static [&'static str] =
    &["id", "name", "createdAt", "updatedAt", "deletedAt"];
  const DEPENDENTS: &'static [&'static str] = &["Question"];

  fn key(&self) -> Uuid { self.id }

  fn timestamps(&self) -> &Timestamps { &self.timestamps }

  fn validate_new(new: &NewSource) -> Result<()> {
    require_non_empty("name", &new.name)
  }

  fn validate_patch(patch: &SourcePatch) -> Result<()> {
    match &patch.name {
      Some(name) => require_non_empty("name", name),
      None => Ok(()),
    }
  }

  fn tombstone_patch(&self) -> Option<SourcePatch> {
    Some(SourcePatch { name: Some(tombstone(&self.name, self.id)) })
  }

  fn revive_patch(&self) -> Option<SourcePatch> {
    untombstone(&self.name, self.id)
      .map(|name| SourcePatch { name: Some(name.to_owned()) })
  }
}
