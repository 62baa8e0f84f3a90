//! # tabula-orm
//!
//! Schema-typed tables over embedded SQLite: declare a table as an
//! ordered set of [`Field`]s, query it through the immutable builder
//! from `tabula-core`, and persist rows with single-statement upserts.
//!
//! This crate provides:
//! - [`Field`] — column descriptors that render their own DDL clause
//! - [`Schema`] / [`SchemaRegistry`] — declared tables and the explicit,
//!   caller-owned registry handed to initialization
//! - [`Row`] — row instances with save/delete and lazy foreign-key
//!   resolution
//! - [`Database`] — the live handle every statement funnels through
//! - [`Execute`] — terminal query operations (`all`, `first`, `get`,
//!   `count`, `delete`, …)
//!
//! ## Quick start
//!
//! ```no_run
//! use rusqlite::Connection;
//! use tabula_orm::{Database, Execute, Field, Schema};
//!
//! let artist = Schema::builder("Artist")
//!     .field("first_name", Field::text().default("NA"))
//!     .field("last_name", Field::text().default("NA"))
//!     .build();
//!
//! let db = Database::new(Connection::open_in_memory()?)
//!     .with_schemas([artist.clone()]);
//! db.execute(&artist.create_ddl(), &[])?;
//!
//! let mut doja = artist.row_from(["Doja", "Cat"]);
//! doja.save(&db)?;
//!
//! let found = artist
//!     .query()
//!     .filter(artist.col("last_name").eq("Cat"))
//!     .get(&db)?;
//! assert!(found == doja.id().unwrap());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Queries are lazy values; nothing runs until a terminal operation is
//! called with a [`Database`]. Initialization — catalog diffing and
//! migration — lives in `tabula-migrate`.

mod database;
mod error;
mod exec;
mod field;
mod row;
mod schema;

pub use database::Database;
pub use error::{OrmError, Result};
pub use exec::Execute;
pub use field::{ColumnType, Conflict, Field, FkAction};
pub use row::Row;
pub use schema::{Schema, SchemaBuilder, SchemaRegistry};

// Re-export the query-construction surface from tabula-core.
pub use tabula_core::{col, Aggregate, ColumnRef, Expr, Query, ToValue, Value};
