//! Filter predicates and the `where` object parser.
//!
//! [`parse_where`] turns a JSON-like object, usually decoded from a query
//! string, into a [`Predicate`] tree that storage backends translate into
//! their own query language.
//!
//! # Grammar
//!
//! | Input | Meaning |
//! |-------|---------|
//! | `{"name": "x"}` | equality; `null` means "is null" |
//! | `{"name": ["x", "y"]}` | membership |
//! | `{"agreeLevel": {"gte": 2, "lt": 5}}` | operators `eq ne gt gte lt lte like in notIn` |
//! | `{"or": [{...}, {...}]}` | disjunction; `and` likewise |
//!
//! Sibling keys are combined with AND. Strings stay [`Scalar::Text`]; a
//! backend binds each operand against the type of the column it compares
//! with, so `"3"` still matches an integer column and `"007"` a text one.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

// ─── Predicate tree ──────────────────────────────────────────────────────────

/// A literal operand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
  Eq,
  Ne,
  Gt,
  Gte,
  Lt,
  Lte,
  Like,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
  Compare(Comparison, Scalar),
  In(Vec<Scalar>),
  NotIn(Vec<Scalar>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Predicate {
  /// Every member must hold. An empty list matches everything.
  All(Vec<Predicate>),
  /// At least one member must hold.
  Any(Vec<Predicate>),
  Field { field: String, condition: Condition },
}

impl Predicate {
  /// Shorthand for `field = value`.
  pub fn eq(field: impl Into<String>, value: Scalar) -> Self {
    Self::Field {
      field:     field.into(),
      condition: Condition::Compare(Comparison::Eq, value),
    }
  }

  /// Every field name referenced anywhere in the tree.
  pub fn fields(&self) -> Vec<&str> {
    let mut out = Vec::new();
    self.collect_fields(&mut out);
    out
  }

  fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
    match self {
      Self::All(members) | Self::Any(members) => {
        members.iter().for_each(|m| m.collect_fields(out));
      }
      Self::Field { field, .. } => out.push(field),
    }
  }

  /// Fail with [`Error::BadFilter`] if any field is not in `allowed`.
  pub fn check_fields(&self, allowed: &[&str]) -> Result<()> {
    match self.fields().into_iter().find(|f| !allowed.contains(f)) {
      Some(unknown) => Err(Error::bad_filter(format!(
        "unknown field {unknown:?}; expected one of {}",
        allowed.join(", ")
      ))),
      None => Ok(()),
    }
  }
}

// ─── Parser ──────────────────────────────────────────────────────────────────

/// Translate a raw `where` object into a [`Predicate`].
///
/// The result is always a top-level [`Predicate::All`]. Parsing is pure, and
/// the same input always yields the same tree.
pub fn parse_where(raw: &Map<String, Value>) -> Result<Predicate> {
  let mut members = Vec::with_capacity(raw.len());
  for (key, value) in raw {
    match key.as_str() {
      "and" => members.push(Predicate::All(parse_group(key, value)?)),
      "or" => members.push(Predicate::Any(parse_group(key, value)?)),
      "" => return Err(Error::bad_filter("empty field name")),
      field => members.extend(parse_field(field, value)?),
    }
  }
  Ok(Predicate::All(members))
}

fn parse_group(key: &str, value: &Value) -> Result<Vec<Predicate>> {
  let members: Vec<&Value> = match value {
    Value::Array(items) => items.iter().collect(),
    // Bracket-decoded query strings produce {"0": {...}, "1": {...}}.
    Value::Object(items) => items.values().collect(),
    _ => {
      return Err(Error::bad_filter(format!(
        "{key:?} expects a list of objects"
      )));
    }
  };
  if members.is_empty() {
    return Err(Error::bad_filter(format!("{key:?} must not be empty")));
  }
  members
    .into_iter()
    .map(|member| match member {
      Value::Object(inner) => parse_where(inner),
      _ => Err(Error::bad_filter(format!(
        "members of {key:?} must be objects"
      ))),
    })
    .collect()
}

fn parse_field(field: &str, value: &Value) -> Result<Vec<Predicate>> {
  let field_pred = |condition| Predicate::Field { field: field.to_owned(), condition };

  match value {
    Value::Array(items) => {
      Ok(vec![field_pred(Condition::In(parse_list(field, items)?))])
    }
    Value::Object(ops) => {
      if ops.is_empty() {
        return Err(Error::bad_filter(format!("no operator given for {field:?}")));
      }
      ops
        .iter()
        .map(|(op, operand)| Ok(field_pred(parse_operator(field, op, operand)?)))
        .collect()
    }
    scalar => Ok(vec![field_pred(Condition::Compare(
      Comparison::Eq,
      parse_scalar(field, scalar)?,
    ))]),
  }
}

fn parse_operator(field: &str, op: &str, operand: &Value) -> Result<Condition> {
  let comparison = match op {
    "eq" => Comparison::Eq,
    "ne" => Comparison::Ne,
    "gt" => Comparison::Gt,
    "gte" => Comparison::Gte,
    "lt" => Comparison::Lt,
    "lte" => Comparison::Lte,
    "like" => {
      return match operand {
        Value::String(pattern) => {
          Ok(Condition::Compare(Comparison::Like, Scalar::Text(pattern.clone())))
        }
        _ => Err(Error::bad_filter(format!("like on {field:?} expects a string"))),
      };
    }
    "in" => return Ok(Condition::In(parse_members(field, operand)?)),
    "notIn" => return Ok(Condition::NotIn(parse_members(field, operand)?)),
    other => {
      return Err(Error::bad_filter(format!(
        "unknown operator {other:?} on {field:?}"
      )));
    }
  };
  Ok(Condition::Compare(comparison, parse_scalar(field, operand)?))
}

/// `in` / `notIn` accept a list or a comma-separated string.
fn parse_members(field: &str, operand: &Value) -> Result<Vec<Scalar>> {
  match operand {
    Value::Array(items) => parse_list(field, items),
    Value::String(joined) => {
      let members: Vec<Scalar> = joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Scalar::Text(s.to_owned()))
        .collect();
      if members.is_empty() {
        return Err(Error::bad_filter(format!("empty list for {field:?}")));
      }
      Ok(members)
    }
    // Bracket-decoded `where[f][in][0]=a&where[f][in][1]=b`.
    Value::Object(items) => {
      let values: Vec<Value> = items.values().cloned().collect();
      parse_list(field, &values)
    }
    _ => Err(Error::bad_filter(format!("{field:?} expects a list"))),
  }
}

fn parse_list(field: &str, items: &[Value]) -> Result<Vec<Scalar>> {
  if items.is_empty() {
    return Err(Error::bad_filter(format!("empty list for {field:?}")));
  }
  items.iter().map(|item| parse_scalar(field, item)).collect()
}

fn parse_scalar(field: &str, value: &Value) -> Result<Scalar> {
  match value {
    Value::Null => Ok(Scalar::Null),
    Value::Bool(b) => Ok(Scalar::Bool(*b)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => Ok(Scalar::Int(i)),
      None => n
        .as_f64()
        .map(Scalar::Float)
        .ok_or_else(|| Error::bad_filter(format!("number out of range for {field:?}"))),
    },
    Value::String(s) => Ok(Scalar::Text(s.clone())),
    Value::Array(_) | Value::Object(_) => Err(Error::bad_filter(format!(
      "nested value not allowed here for {field:?}"
    ))),
  }
}
