//! Query-string decoding shared by every resource.
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `where=<json>` | filter object, see [`compass_core::filter`] |
//! | `where[field]=v`, `where[field][op]=v`, `where[or][0][field]=v` | the same object spelled as bracket keys |
//! | `include-deleted` | also return soft-deleted rows |
//! | `restore` | `PUT`/`PATCH` may target and revive a soft-deleted row |
//! | `force` | `DELETE` removes the row for good |
//! | `no-save` | `POST /results` scores without storing |
//! | `with-questions` | sources embed their live questions |
//!
//! Flags accept `true`, `false`, `1`, `0`, or no value (`?force`). Unknown
//! keys are ignored. A bracket value of `null` means null; every other
//! bracket value is text, as are strings inside `where=<json>`.

use compass_core::filter::{Predicate, parse_where};
use serde_json::{Map, Value};

use crate::error::ApiError;

#[derive(Debug, Default)]
pub struct Params {
  pub filter:          Option<Predicate>,
  pub include_deleted: bool,
  pub restore:         bool,
  pub force:           bool,
  pub no_save:         bool,
  pub with_questions:  bool,
}

impl Params {
  /// Decode raw `(key, value)` pairs as delivered by
  /// `Query<Vec<(String, String)>>`.
  pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ApiError> {
    let mut params = Params::default();
    let mut raw_where = Map::new();

    for (key, value) in pairs {
      match key.as_str() {
        "include-deleted" => params.include_deleted = flag(&key, &value)?,
        "restore" => params.restore = flag(&key, &value)?,
        "force" => params.force = flag(&key, &value)?,
        "no-save" => params.no_save = flag(&key, &value)?,
        "with-questions" => params.with_questions = flag(&key, &value)?,
        "where" => match serde_json::from_str(&value) {
          Ok(Value::Object(object)) => raw_where.extend(object),
          _ => {
            return Err(ApiError::BadRequest(
              "where must be a JSON object".to_owned(),
            ));
          }
        },
        _ => {
          if let Some(path) = bracket_path(&key) {
            insert_path(&mut raw_where, &path, value)?;
          }
        }
      }
    }

    if !raw_where.is_empty() {
      params.filter = Some(parse_where(&raw_where)?);
    }
    Ok(params)
  }
}

fn flag(key: &str, value: &str) -> Result<bool, ApiError> {
  match value {
    "" | "true" | "1" => Ok(true),
    "false" | "0" => Ok(false),
    other => Err(ApiError::BadRequest(format!(
      "{key} expects a boolean, got {other:?}"
    ))),
  }
}

/// `where[a][b]` → `["a", "b"]`. Returns `None` for keys outside `where`.
fn bracket_path(key: &str) -> Option<Vec<&str>> {
  let mut rest = key.strip_prefix("where")?;
  let mut path = Vec::new();
  while !rest.is_empty() {
    let inner = rest.strip_prefix('[')?;
    let end = inner.find(']')?;
    path.push(&inner[..end]);
    rest = &inner[end + 1..];
  }
  (!path.is_empty()).then_some(path)
}

fn insert_path(
  target: &mut Map<String, Value>,
  path: &[&str],
  value: String,
) -> Result<(), ApiError> {
  let clash = || ApiError::BadRequest(format!("conflicting where keys at {path:?}"));
  match path {
    [] => Ok(()),
    [field] => {
      target.insert((*field).to_owned(), bracket_value(value));
      Ok(())
    }
    // where[field][]=a&where[field][]=b
    [field, ""] => match target
      .entry(*field)
      .or_insert_with(|| Value::Array(Vec::new()))
    {
      Value::Array(items) => {
        items.push(bracket_value(value));
        Ok(())
      }
      _ => Err(clash()),
    },
    [head, rest @ ..] => match target
      .entry(*head)
      .or_insert_with(|| Value::Object(Map::new()))
    {
      Value::Object(inner) => insert_path(inner, rest, value),
      _ => Err(clash()),
    },
  }
}

fn bracket_value(value: String) -> Value {
  if value == "null" {
    Value::Null
  } else {
    Value::String(value)
  }
}
