//! Party: a political party whose stances the quiz compares against.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  entity::{Entity, Timestamps, require_non_empty, tombstone, untombstone},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
  pub id:           Uuid,
  /// Unique among live rows.
  pub name:         String,
  /// Unique among live rows.
  pub abbreviation: String,
  /// Identifier in an upstream registry, if any.
  pub external_id:  Option<String>,
  #[serde(flatten)]
  pub timestamps:   Timestamps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParty {
  pub name:         String,
  pub abbreviation: String,
  pub external_id:  Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyPatch {
  pub name:         Option<String>,
  pub abbreviation: Option<String>,
  pub external_id:  Option<String>,
}

impl Entity for Party {
  type Key = Uuid;
  type New = NewParty;
  type Patch = PartyPatch;

  const KIND: &'static str = "Party";
  const FIELDS: &'static [&'static str] = &[
    "id",
    "name",
    "abbreviation",
    "externalId",
    "createdAt",
    "updatedAt",
    "deletedAt",
  ];

  fn key(&self) -> Uuid { self.id }

  fn timestamps(&self) -> &Timestamps { &self.timestamps }

  fn validate_new(new: &NewParty) -> Result<()> {
    require_non_empty("name", &new.name)?;
    require_non_empty("abbreviation", &new.abbreviation)
  }

  fn validate_patch(patch: &PartyPatch) -> Result<()> {
    if let Some(name) = &patch.name {
      require_non_empty("name", name)?;
    }
    if let Some(abbreviation) = &patch.abbreviation {
      require_non_empty("abbreviation", abbreviation)?;
    }
    Ok(())
  }

  fn tombstone_patch(&self) -> Option<PartyPatch> {
    Some(PartyPatch {
      name:         Some(tombstone(&self.name, self.id)),
      abbreviation: Some(tombstone(&self.abbreviation, self.id)),
      external_id:  None,
    })
  }

  fn revive_patch(&self) -> Option<PartyPatch> {
    let name = untombstone(&self.name, self.id).map(str::to_owned);
    let abbreviation =
      untombstone(&self.abbreviation, self.id).map(str::to_owned);
    if name.is_none() && abbreviation.is_none() {
      return None;
    }
    Some(PartyPatch { name, abbreviation, external_id: None })
  }
}
