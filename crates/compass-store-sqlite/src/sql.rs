//! Statement text for the generic repository, and predicate rendering.
//!
//! Every statement uses positional `?` placeholders; values travel alongside
//! as [`rusqlite::types::Value`]s.

use compass_core::filter::{Comparison, Condition, Predicate, Scalar};
use rusqlite::types::Value;

use crate::{
  Error, Result,
  encode::bind_scalar,
  table::{ColumnType, Table, column_for, column_type},
};

const TIMESTAMP_COLUMNS: &str = "created_at, updated_at, deleted_at";

fn select_list<E: Table>() -> String {
  format!("{}, {TIMESTAMP_COLUMNS}", E::COLUMNS.join(", "))
}

/// `id = ?` or `question_id = ? AND party_id = ?`.
pub fn key_clause<E: Table>() -> String {
  E::KEY_COLUMNS
    .iter()
    .map(|c| format!("{c} = ?"))
    .collect::<Vec<_>>()
    .join(" AND ")
}

/// `SELECT ... FROM <table> WHERE <filter>`; the filter has no live-row
/// restriction.
pub fn select_where<E: Table>(filter: &str) -> String {
  format!("SELECT {} FROM {} WHERE {filter} ORDER BY rowid", select_list::<E>(), E::TABLE)
}

pub fn select_by_key<E: Table>(include_deleted: bool) -> String {
  let mut filter = key_clause::<E>();
  if !include_deleted {
    filter.push_str(" AND deleted_at IS NULL");
  }
  select_where::<E>(&filter)
}

pub fn insert<E: Table>() -> String {
  let placeholders = vec!["?"; E::COLUMNS.len() + 2].join(", ");
  format!(
    "INSERT INTO {} ({}, created_at, updated_at) VALUES ({placeholders})",
    E::TABLE,
    E::COLUMNS.join(", "),
  )
}

/// `UPDATE` setting `columns` plus `updated_at`, addressed by key.
pub fn update<E: Table>(columns: &[&str]) -> String {
  let sets: Vec<String> = columns
    .iter()
    .chain(std::iter::once(&"updated_at"))
    .map(|c| format!("{c} = ?"))
    .collect();
  format!("UPDATE {} SET {} WHERE {}", E::TABLE, sets.join(", "), key_clause::<E>())
}

pub fn soft_delete<E: Table>() -> String {
  format!(
    "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE {} AND deleted_at IS NULL",
    E::TABLE,
    key_clause::<E>(),
  )
}

pub fn restore<E: Table>() -> String {
  format!(
    "UPDATE {} SET deleted_at = NULL, updated_at = ? WHERE {}",
    E::TABLE,
    key_clause::<E>(),
  )
}

pub fn hard_delete<E: Table>() -> String {
  format!("DELETE FROM {} WHERE {}", E::TABLE, key_clause::<E>())
}

pub fn count_live_children(table: &str, column: &str) -> String {
  format!("SELECT COUNT(*) FROM {table} WHERE {column} = ? AND deleted_at IS NULL")
}

// ─── Predicates ──────────────────────────────────────────────────────────────

/// Render `predicate` as a SQL boolean expression over `E`'s columns,
/// appending its operands to `params` in placeholder order.
pub fn render<E: Table>(predicate: &Predicate, params: &mut Vec<Value>) -> Result<String> {
  match predicate {
    Predicate::All(members) => render_group::<E>(members, " AND ", "1 = 1", params),
    Predicate::Any(members) => render_group::<E>(members, " OR ", "1 = 0", params),
    Predicate::Field { field, condition } => {
      let column =
        column_for::<E>(field).ok_or_else(|| Error::UnknownField(field.clone()))?;
      let ty = column_type::<E>(&column);
      Ok(render_condition(&column, ty, condition, params))
    }
  }
}

fn render_group<E: Table>(
  members: &[Predicate],
  joiner: &str,
  empty: &str,
  params: &mut Vec<Value>,
) -> Result<String> {
  if members.is_empty() {
    return Ok(empty.to_owned());
  }
  let parts = members
    .iter()
    .map(|m| render::<E>(m, params))
    .collect::<Result<Vec<_>>>()?;
  Ok(format!("({})", parts.join(joiner)))
}

fn render_condition(
  column: &str,
  ty: ColumnType,
  condition: &Condition,
  params: &mut Vec<Value>,
) -> String {
  match condition {
    Condition::Compare(op, operand) => {
      // LIKE patterns are always text.
      let bind_as = if *op == Comparison::Like { ColumnType::Text } else { ty };
      let value = bind_scalar(operand, bind_as);
      match (op, &value) {
        (Comparison::Eq, Value::Null) => format!("{column} IS NULL"),
        (Comparison::Ne, Value::Null) => format!("{column} IS NOT NULL"),
        _ => {
          params.push(value);
          format!("{column} {} ?", sql_operator(*op))
        }
      }
    }
    Condition::In(members) => render_list(column, ty, "IN", members, params),
    Condition::NotIn(members) => render_list(column, ty, "NOT IN", members, params),
  }
}

fn render_list(
  column: &str,
  ty: ColumnType,
  keyword: &str,
  members: &[Scalar],
  params: &mut Vec<Value>,
) -> String {
  params.extend(members.iter().map(|m| bind_scalar(m, ty)));
  format!("{column} {keyword} ({})", vec!["?"; members.len()].join(", "))
}

fn sql_operator(op: Comparison) -> &'static str {
  match op {
    Comparison::Eq => "=",
    Comparison::Ne => "<>",
    Comparison::Gt => ">",
    Comparison::Gte => ">=",
    Comparison::Lt => "<",
    Comparison::Lte => "<=",
    Comparison::Like => "LIKE",
  }
}

#[cfg(test)]
mod tests {
  use compass_core::{
    answer::Answer,
    filter::parse_where,
    party::Party,
    question::Question,
    source::Source,
  };
  use serde_json::json;

  use super::*;

  fn rendered<E: Table>(raw: serde_json::Value) -> (String, Vec<Value>) {
    let serde_json::Value::Object(map) = raw else { panic!("object expected") };
    let predicate = parse_where(&map).unwrap();
    let mut params = Vec::new();
    let sql = render::<E>(&predicate, &mut params).unwrap();
    (sql, params)
  }

  #[test]
  fn composite_keys_join_with_and() {
    assert_eq!(key_clause::<Answer>(), "question_id = ? AND party_id = ?");
    assert_eq!(key_clause::<Source>(), "id = ?");
  }

  #[test]
  fn equality_and_null_checks() {
    let (sql, params) = rendered::<Party>(json!({ "name": "Greens", "externalId": null }));
    assert!(sql.contains("name = ?"));
    assert!(sql.contains("external_id IS NULL"));
    assert_eq!(params, vec![Value::Text("Greens".into())]);
  }

  #[test]
  fn membership_and_groups() {
    let (sql, params) =
      rendered::<Answer>(json!({ "or": [{ "agreeLevel": [1, 2] }, { "statement": { "ne": null } }] }));
    assert_eq!(sql, "(((agree_level IN (?, ?)) OR (statement IS NOT NULL)))");
    assert_eq!(params, vec![Value::Integer(1), Value::Integer(2)]);
  }

  #[test]
  fn operands_follow_the_column_type() {
    let (_, params) = rendered::<Source>(json!({ "name": "007" }));
    assert_eq!(params, vec![Value::Text("007".into())]);

    let (sql, params) = rendered::<Answer>(json!({ "agreeLevel": { "gte": "3" } }));
    assert_eq!(sql, "(agree_level >= ?)");
    assert_eq!(params, vec![Value::Integer(3)]);

    let (_, params) = rendered::<Question>(json!({ "isPrimary": "true", "title": "true" }));
    assert!(params.contains(&Value::Integer(1)));
    assert!(params.contains(&Value::Text("true".into())));

    let (_, params) = rendered::<Party>(json!({ "abbreviation": { "in": "01,2" } }));
    assert_eq!(params, vec![Value::Text("01".into()), Value::Text("2".into())]);
  }

  #[test]
  fn unknown_fields_are_reported() {
    let predicate = Predicate::eq("colour", Scalar::Text("red".into()));
    let err = render::<Source>(&predicate, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownField(f) if f == "colour"));
  }

  #[test]
  fn empty_conjunction_matches_everything() {
    let mut params = Vec::new();
    assert_eq!(render::<Source>(&Predicate::All(vec![]), &mut params).unwrap(), "1 = 1");
    assert!(params.is_empty());
  }
}
