//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Enums are stored as their kebab/lowercase
//! labels and JSON columns as compact JSON.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use compass_core::{entity::Timestamps, filter::Scalar};
use rusqlite::{
  Row,
  types::{Type, Value},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::table::ColumnType;

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn uuid_value(id: Uuid) -> Value { Value::Text(encode_uuid(id)) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── Column values ────────────────────────────────────────────────────────────

pub fn text(s: impl Into<String>) -> Value { Value::Text(s.into()) }

pub fn opt_text(s: Option<String>) -> Value { s.map_or(Value::Null, Value::Text) }

pub fn opt_int(i: Option<i64>) -> Value { i.map_or(Value::Null, Value::Integer) }

/// Bind a filter operand as the value a `column` of that type compares
/// equal to. Text that does not fit a numeric column is bound unchanged and
/// matches nothing.
pub fn bind_scalar(scalar: &Scalar, column: ColumnType) -> Value {
  match (scalar, column) {
    (Scalar::Null, _) => Value::Null,
    (Scalar::Text(s), ColumnType::Text) => Value::Text(s.clone()),
    (Scalar::Bool(b), ColumnType::Text) => Value::Text(b.to_string()),
    (Scalar::Int(i), ColumnType::Text) => Value::Text(i.to_string()),
    (Scalar::Float(f), ColumnType::Text) => Value::Text(f.to_string()),
    (Scalar::Text(s), ColumnType::Boolean) => match s.trim() {
      "true" => Value::Integer(1),
      "false" => Value::Integer(0),
      other => numeric(other),
    },
    (Scalar::Text(s), ColumnType::Integer) => numeric(s.trim()),
    (Scalar::Bool(b), _) => Value::Integer(i64::from(*b)),
    (Scalar::Int(i), _) => Value::Integer(*i),
    (Scalar::Float(f), _) => Value::Real(*f),
  }
}

fn numeric(text: &str) -> Value {
  if let Ok(i) = text.parse::<i64>() {
    Value::Integer(i)
  } else if let Ok(f) = text.parse::<f64>() {
    Value::Real(f)
  } else {
    Value::Text(text.to_owned())
  }
}

// ─── Row readers ──────────────────────────────────────────────────────────────

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn read_parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  let raw: String = row.get(idx)?;
  raw.parse().map_err(|e| conversion_error(idx, e))
}

pub fn read_opt_parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  let raw: Option<String> = row.get(idx)?;
  raw
    .map(|s| s.parse().map_err(|e| conversion_error(idx, e)))
    .transpose()
}

pub fn read_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
  read_parsed(row, idx)
}

pub fn read_opt_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
  read_opt_parsed(row, idx)
}

fn read_opt_dt(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
  let raw: Option<String> = row.get(idx)?;
  raw
    .map(|s| {
      DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn read_dt(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
  read_opt_dt(row, idx)?
    .ok_or(rusqlite::Error::InvalidColumnType(idx, "timestamp".into(), Type::Null))
}

pub fn read_json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
  let raw: String = row.get(idx)?;
  serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

/// Read the `created_at, updated_at, deleted_at` triple starting at `offset`.
pub fn read_timestamps(row: &Row<'_>, offset: usize) -> rusqlite::Result<Timestamps> {
  Ok(Timestamps {
    created_at: read_dt(row, offset)?,
    updated_at: read_dt(row, offset + 1)?,
    deleted_at: read_opt_dt(row, offset + 2)?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text_scalar(s: &str) -> Scalar { Scalar::Text(s.to_owned()) }

  #[test]
  fn text_columns_keep_operands_as_text() {
    for raw in ["007", "true", "null", "1e3"] {
      assert_eq!(bind_scalar(&text_scalar(raw), ColumnType::Text), Value::Text(raw.into()));
    }
    assert_eq!(bind_scalar(&Scalar::Int(7), ColumnType::Text), Value::Text("7".into()));
  }

  #[test]
  fn numeric_columns_parse_text_operands() {
    assert_eq!(bind_scalar(&text_scalar("3"), ColumnType::Integer), Value::Integer(3));
    assert_eq!(bind_scalar(&text_scalar("2.5"), ColumnType::Integer), Value::Real(2.5));
    assert_eq!(bind_scalar(&text_scalar("true"), ColumnType::Boolean), Value::Integer(1));
    assert_eq!(bind_scalar(&text_scalar("0"), ColumnType::Boolean), Value::Integer(0));
    assert_eq!(bind_scalar(&Scalar::Bool(false), ColumnType::Boolean), Value::Integer(0));
    assert_eq!(
      bind_scalar(&text_scalar("many"), ColumnType::Integer),
      Value::Text("many".into())
    );
  }
}
