//! [`SqliteStore`]: the SQLite implementation of [`Repository`].

use std::path::Path;

use chrono::Utc;
use compass_core::{filter::Predicate, store::Repository};
use rusqlite::{OptionalExtension as _, params_from_iter, types::Value};

use crate::{
  Result,
  encode::encode_dt,
  schema::SCHEMA,
  sql,
  table::Table,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A compass store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a key-addressed statement and report whether it touched a row.
  async fn execute_keyed(&self, statement: String, params: Vec<Value>) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&statement, params_from_iter(params))?))
      .await?;
    Ok(changed > 0)
  }
}

fn now() -> Value { Value::Text(encode_dt(Utc::now())) }

// ─── Repository impl ─────────────────────────────────────────────────────────

impl<E: Table> Repository<E> for SqliteStore {
  type Error = crate::Error;

  async fn bulk_create(&self, records: Vec<E::New>) -> Result<Vec<E>> {
    let rows = records
      .into_iter()
      .map(|record| {
        let (key, values) = E::insert_values(record)?;
        Ok((E::key_values(key), values))
      })
      .collect::<Result<Vec<_>>>()?;
    let stamp = now();
    let insert_sql = sql::insert::<E>();
    let select_sql = sql::select_by_key::<E>(true);

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let created = {
          let mut insert = tx.prepare(&insert_sql)?;
          let mut select = tx.prepare(&select_sql)?;
          let mut created = Vec::with_capacity(rows.len());
          for (key, mut values) in rows {
            values.push(stamp.clone());
            values.push(stamp.clone());
            insert.execute(params_from_iter(values))?;
            created.push(select.query_row(params_from_iter(key), E::from_row)?);
          }
          created
        };
        tx.commit()?;
        Ok(created)
      })
      .await?;

    Ok(created)
  }

  async fn find_all<'a>(
    &'a self,
    predicate: Option<&'a Predicate>,
    include_deleted: bool,
  ) -> Result<Vec<E>> {
    let mut params = Vec::new();
    let mut filter = match predicate {
      Some(p) => sql::render::<E>(p, &mut params)?,
      None => "1 = 1".to_owned(),
    };
    if !include_deleted {
      filter = format!("{filter} AND deleted_at IS NULL");
    }
    let statement = sql::select_where::<E>(&filter);

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&statement)?;
        let rows = stmt
          .query_map(params_from_iter(params), E::from_row)?
          .collect::<rusqlite::Result<Vec<E>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn find_one(&self, key: E::Key, include_deleted: bool) -> Result<Option<E>> {
    let statement = sql::select_by_key::<E>(include_deleted);
    let params = E::key_values(key);

    let row = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&statement, params_from_iter(params), E::from_row)
            .optional()?,
        )
      })
      .await?;

    Ok(row)
  }

  async fn update_row(&self, key: E::Key, patch: E::Patch) -> Result<Option<E>> {
    let (columns, mut params): (Vec<&'static str>, Vec<Value>) =
      E::assignments(patch)?.into_iter().unzip();
    params.push(now());
    params.extend(E::key_values(key));
    let update_sql = sql::update::<E>(&columns);
    let select_sql = sql::select_by_key::<E>(true);
    let key_params = E::key_values(key);

    let row = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if tx.execute(&update_sql, params_from_iter(params))? == 0 {
          return Ok(None);
        }
        let row = tx.query_row(&select_sql, params_from_iter(key_params), E::from_row)?;
        tx.commit()?;
        Ok(Some(row))
      })
      .await?;

    Ok(row)
  }

  async fn soft_delete(&self, key: E::Key) -> Result<bool> {
    let stamp = now();
    let mut params = vec![stamp.clone(), stamp];
    params.extend(E::key_values(key));
    self.execute_keyed(sql::soft_delete::<E>(), params).await
  }

  async fn restore(&self, key: E::Key) -> Result<Option<E>> {
    let mut params = vec![now()];
    params.extend(E::key_values(key));
    if !self.execute_keyed(sql::restore::<E>(), params).await? {
      return Ok(None);
    }
    Repository::<E>::find_one(self, key, true).await
  }

  async fn hard_delete(&self, key: E::Key) -> Result<bool> {
    self
      .execute_keyed(sql::hard_delete::<E>(), E::key_values(key))
      .await
  }

  async fn count_live_dependents(&self, key: E::Key) -> Result<u64> {
    let Some(key_value) = E::key_values(key).into_iter().next() else {
      return Ok(0);
    };
    let statements: Vec<String> = E::CHILD_TABLES
      .iter()
      .map(|(table, column)| sql::count_live_children(table, column))
      .collect();

    let total = self
      .conn
      .call(move |conn| {
        let mut total = 0_u64;
        for statement in &statements {
          let count: i64 = conn.query_row(statement, rusqlite::params![key_value], |r| r.get(0))?;
          total += count.unsigned_abs();
        }
        Ok(total)
      })
      .await?;

    Ok(total)
  }
}
