//! The [`Table`] mapping between each entity and its SQLite table.
//!
//! Columns are the snake_case spelling of the entity's API field names, so a
//! filter field resolves to a column without a per-entity lookup table.

use compass_core::{
  answer::{Answer, AnswerKey, AnswerPatch, NewAnswer},
  entity::Entity,
  party::{NewParty, Party, PartyPatch},
  question::{NewQuestion, Question, QuestionPatch},
  result::{NewQuizResult, QuizResult, QuizResultPatch},
  source::{NewSource, Source, SourcePatch},
};
use rusqlite::{Row, types::Value};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    opt_int, opt_text, read_json, read_opt_parsed, read_opt_uuid, read_parsed,
    read_timestamps, read_uuid, text, uuid_value,
  },
};

/// Declared type of a filterable column; filter operands are bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Text,
  Integer,
  /// `INTEGER` holding `0` or `1`.
  Boolean,
}

/// An entity stored in one SQLite table.
///
/// Every table also has `created_at`, `updated_at` and `deleted_at`
/// columns, selected after [`Table::COLUMNS`].
pub trait Table: Entity {
  const TABLE: &'static str;
  const KEY_COLUMNS: &'static [&'static str];
  /// Data columns including the key, in the order `from_row` reads them.
  const COLUMNS: &'static [&'static str];
  /// `(table, foreign key column)` pairs counted by the delete guard.
  /// Only meaningful for single-column keys.
  const CHILD_TABLES: &'static [(&'static str, &'static str)] = &[];
  /// Columns that are not `TEXT`.
  const TYPED_COLUMNS: &'static [(&'static str, ColumnType)] = &[];

  fn key_values(key: Self::Key) -> Vec<Value>;

  /// Assign a key and encode the record in [`Table::COLUMNS`] order.
  fn insert_values(new: Self::New) -> Result<(Self::Key, Vec<Value>)>;

  /// `(column, value)` for every field the patch sets.
  fn assignments(patch: Self::Patch) -> Result<Vec<(&'static str, Value)>>;

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Column backing API field `field`, if the entity exposes it.
pub fn column_for<E: Entity>(field: &str) -> Option<String> {
  if !E::FIELDS.contains(&field) {
    return None;
  }
  let mut column = String::with_capacity(field.len() + 4);
  for ch in field.chars() {
    if ch.is_ascii_uppercase() {
      column.push('_');
      column.push(ch.to_ascii_lowercase());
    } else {
      column.push(ch);
    }
  }
  Some(column)
}

pub fn column_type<E: Table>(column: &str) -> ColumnType {
  E::TYPED_COLUMNS
    .iter()
    .find(|(name, _)| *name == column)
    .map_or(ColumnType::Text, |(_, ty)| *ty)
}

fn push<T>(out: &mut Vec<(&'static str, Value)>, column: &'static str, value: Option<T>, f: impl FnOnce(T) -> Value) {
  if let Some(v) = value {
    out.push((column, f(v)));
  }
}

// ─── Source ──────────────────────────────────────────────────────────────────

impl Table for Source {
  const TABLE: &'static str = "sources";
  const KEY_COLUMNS: &'static [&'static str] = &["id"];
  const COLUMNS: &'static [&'static str] = &["id", "name"];
  const CHILD_TABLES: &'static [(&'static str, &'static str)] =
    &[("questions", "source_id")];

  fn key_values(key: Uuid) -> Vec<Value> { vec![uuid_value(key)] }

  fn insert_values(new: NewSource) -> Result<(Uuid, Vec<Value>)> {
    let id = Uuid::new_v4();
    Ok((id, vec![uuid_value(id), text(new.name)]))
  }

  fn assignments(patch: SourcePatch) -> Result<Vec<(&'static str, Value)>> {
    let mut out = Vec::new();
    push(&mut out, "name", patch.name, text);
    Ok(out)
  }

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Source {
      id:         read_uuid(row, 0)?,
      name:       row.get(1)?,
      timestamps: read_timestamps(row, 2)?,
    })
  }
}

// ─── Question ────────────────────────────────────────────────────────────────

impl Table for Question {
  const TABLE: &'static str = "questions";
  const KEY_COLUMNS: &'static [&'static str] = &["id"];
  const COLUMNS: &'static [&'static str] =
    &["id", "title", "subtitle", "position", "is_primary", "source_id"];
  const TYPED_COLUMNS: &'static [(&'static str, ColumnType)] =
    &[("is_primary", ColumnType::Boolean)];

  fn key_values(key: Uuid) -> Vec<Value> { vec![uuid_value(key)] }

  fn insert_values(new: NewQuestion) -> Result<(Uuid, Vec<Value>)> {
    let id = Uuid::new_v4();
    Ok((id, vec![
      uuid_value(id),
      text(new.title),
      opt_text(new.subtitle),
      text(new.position.to_string()),
      Value::Integer(i64::from(new.is_primary)),
      uuid_value(new.source_id),
    ]))
  }

  fn assignments(patch: QuestionPatch) -> Result<Vec<(&'static str, Value)>> {
    let mut out = Vec::new();
    push(&mut out, "title", patch.title, text);
    push(&mut out, "subtitle", patch.subtitle, text);
    push(&mut out, "position", patch.position, |p| text(p.to_string()));
    push(&mut out, "is_primary", patch.is_primary, |b| Value::Integer(i64::from(b)));
    push(&mut out, "source_id", patch.source_id, uuid_value);
    Ok(out)
  }

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Question {
      id:         read_uuid(row, 0)?,
      title:      row.get(1)?,
      subtitle:   row.get(2)?,
      position:   read_parsed(row, 3)?,
      is_primary: row.get(4)?,
      source_id:  read_opt_uuid(row, 5)?,
      timestamps: read_timestamps(row, 6)?,
    })
  }
}

// ─── Party ───────────────────────────────────────────────────────────────────

impl Table for Party {
  const TABLE: &'static str = "parties";
  const KEY_COLUMNS: &'static [&'static str] = &["id"];
  const COLUMNS: &'static [&'static str] =
    &["id", "name", "abbreviation", "external_id"];

  fn key_values(key: Uuid) -> Vec<Value> { vec![uuid_value(key)] }

  fn insert_values(new: NewParty) -> Result<(Uuid, Vec<Value>)> {
    let id = Uuid::new_v4();
    Ok((id, vec![
      uuid_value(id),
      text(new.name),
      text(new.abbreviation),
      opt_text(new.external_id),
    ]))
  }

  fn assignments(patch: PartyPatch) -> Result<Vec<(&'static str, Value)>> {
    let mut out = Vec::new();
    push(&mut out, "name", patch.name, text);
    push(&mut out, "abbreviation", patch.abbreviation, text);
    push(&mut out, "external_id", patch.external_id, text);
    Ok(out)
  }

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Party {
      id:           read_uuid(row, 0)?,
      name:         row.get(1)?,
      abbreviation: row.get(2)?,
      external_id:  row.get(3)?,
      timestamps:   read_timestamps(row, 4)?,
    })
  }
}

// ─── Answer ──────────────────────────────────────────────────────────────────

impl Table for Answer {
  const TABLE: &'static str = "answers";
  const KEY_COLUMNS: &'static [&'static str] = &["question_id", "party_id"];
  const COLUMNS: &'static [&'static str] =
    &["question_id", "party_id", "agree_level", "statement", "source"];
  const TYPED_COLUMNS: &'static [(&'static str, ColumnType)] =
    &[("agree_level", ColumnType::Integer)];

  fn key_values(key: AnswerKey) -> Vec<Value> {
    vec![uuid_value(key.question_id), uuid_value(key.party_id)]
  }

  fn insert_values(new: NewAnswer) -> Result<(AnswerKey, Vec<Value>)> {
    let key = AnswerKey { question_id: new.question_id, party_id: new.party_id };
    Ok((key, vec![
      uuid_value(new.question_id),
      uuid_value(new.party_id),
      Value::Integer(i64::from(new.agree_level)),
      opt_text(new.statement),
      opt_text(new.source),
    ]))
  }

  fn assignments(patch: AnswerPatch) -> Result<Vec<(&'static str, Value)>> {
    let mut out = Vec::new();
    push(&mut out, "agree_level", patch.agree_level, |l| Value::Integer(i64::from(l)));
    push(&mut out, "statement", patch.statement, text);
    push(&mut out, "source", patch.source, text);
    Ok(out)
  }

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Answer {
      question_id: read_uuid(row, 0)?,
      party_id:    read_uuid(row, 1)?,
      agree_level: row.get(2)?,
      statement:   row.get(3)?,
      source:      row.get(4)?,
      timestamps:  read_timestamps(row, 5)?,
    })
  }
}

// ─── QuizResult ──────────────────────────────────────────────────────────────

impl Table for QuizResult {
  const TABLE: &'static str = "results";
  const KEY_COLUMNS: &'static [&'static str] = &["id"];
  const COLUMNS: &'static [&'static str] = &[
    "id",
    "answers",
    "ip_address",
    "fingerprint",
    "zip_code",
    "gender",
    "birth_year",
  ];
  const TYPED_COLUMNS: &'static [(&'static str, ColumnType)] = &[
    ("zip_code", ColumnType::Integer),
    ("birth_year", ColumnType::Integer),
  ];

  fn key_values(key: Uuid) -> Vec<Value> { vec![uuid_value(key)] }

  fn insert_values(new: NewQuizResult) -> Result<(Uuid, Vec<Value>)> {
    let id = Uuid::new_v4();
    Ok((id, vec![
      uuid_value(id),
      text(serde_json::to_string(&new.answers)?),
      text(new.ip_address),
      text(new.fingerprint),
      opt_int(new.zip_code.map(i64::from)),
      opt_text(new.gender.map(|g| g.to_string())),
      opt_int(new.birth_year.map(i64::from)),
    ]))
  }

  fn assignments(patch: QuizResultPatch) -> Result<Vec<(&'static str, Value)>> {
    let mut out = Vec::new();
    if let Some(answers) = patch.answers {
      out.push(("answers", text(serde_json::to_string(&answers)?)));
    }
    push(&mut out, "zip_code", patch.zip_code, |z| Value::Integer(i64::from(z)));
    push(&mut out, "gender", patch.gender, |g| text(g.to_string()));
    push(&mut out, "birth_year", patch.birth_year, |y| Value::Integer(i64::from(y)));
    Ok(out)
  }

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(QuizResult {
      id:          read_uuid(row, 0)?,
      answers:     read_json(row, 1)?,
      ip_address:  row.get(2)?,
      fingerprint: row.get(3)?,
      zip_code:    row.get(4)?,
      gender:      read_opt_parsed(row, 5)?,
      birth_year:  row.get(6)?,
      timestamps:  read_timestamps(row, 7)?,
    })
  }
}
