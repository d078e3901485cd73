//! SQLite backend for the compass quiz store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One generic
//! [`Repository`](compass_core::store::Repository) implementation serves
//! every entity through the [`Table`] mapping.

mod encode;
mod schema;
mod sql;
mod store;

pub mod error;
pub mod table;

pub use error::{Error, Result};
pub use store::SqliteStore;
pub use table::Table;
