//! # tabula-core
//!
//! Composable SQL construction for the tabula engine: scalar values,
//! a closed expression union, and an immutable query builder.
//!
//! This crate performs no I/O. It renders SQL text with positional `?`
//! placeholders and, in parallel, the exact parameter sequence the
//! placeholders bind — one placeholder per value operand, nothing
//! interpolated.
//!
//! ## Quick start
//!
//! ```
//! use tabula_core::{col, Query};
//!
//! let q = Query::new("album")
//!     .filter(col("title").eq("Hot Pink"))
//!     .order_by("-id")
//!     .limit(10);
//!
//! let (sql, params) = q.render();
//! assert_eq!(sql, "SELECT * FROM album WHERE title = ? ORDER BY id DESC LIMIT 10");
//! assert_eq!(params.len(), 1);
//! ```
//!
//! Queries are values: every clause method returns a new `Query`, so a
//! query can be held, shared, and extended without aliasing surprises.
//! Subqueries compose the same way:
//!
//! ```
//! use tabula_core::{col, Query};
//!
//! let minors = Query::new("artist").project(["id"]).filter(col("age").lt(18));
//! let q = Query::new("album").filter(col("artist").in_query(minors));
//! assert_eq!(
//!     q.render_sql(),
//!     "SELECT * FROM album WHERE artist IN (SELECT id FROM artist WHERE age < ?)"
//! );
//! ```

mod expr;
mod query;
mod value;

pub use expr::{col, AggFunc, Aggregate, ColumnRef, CompareOp, Expr};
pub use query::{OrderBy, OrderDirection, Query, SelectItem};
pub use value::{ToValue, Value};
