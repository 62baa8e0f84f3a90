//! Terminal operations for queries.
//!
//! [`Execute`] gives [`Query`] its terminal operations against a
//! [`Database`]. Whole-row terminals construct [`Row`] values through
//! the schema attached under the query's table name; narrowed
//! (projected) queries are read with [`Execute::values`] or
//! [`Execute::scalar`] instead.

use tabula_core::{Query, Value};

use crate::database::Database;
use crate::error::{OrmError, Result};
use crate::row::Row;

/// Terminal operations over a [`Query`].
pub trait Execute {
    /// Materializes every matching row.
    fn all(&self, db: &Database) -> Result<Vec<Row>>;

    /// Fetches the first matching row.
    ///
    /// Fails with [`OrmError::DoesNotExist`] when nothing matches.
    fn first(&self, db: &Database) -> Result<Row>;

    /// Fetches exactly one matching row.
    ///
    /// Fails with [`OrmError::DoesNotExist`] on zero matches and
    /// [`OrmError::TooManyExist`] on more than one.
    fn get(&self, db: &Database) -> Result<Row>;

    /// Fetches the row at the given position, applying
    /// `offset = index, limit = 1`.
    fn nth(&self, db: &Database, index: u64) -> Result<Row>;

    /// Materializes the projected value tuples.
    fn values(&self, db: &Database) -> Result<Vec<Vec<Value>>>;

    /// Fetches a single value: first column of the first row.
    fn scalar(&self, db: &Database) -> Result<Value>;

    /// Counts matching rows with a `COUNT(*)` projection through the
    /// builder, never by materializing rows client-side.
    fn count(&self, db: &Database) -> Result<u64>;

    /// Returns whether any row matches.
    fn exists(&self, db: &Database) -> Result<bool>;

    /// Deletes every matching row; returns the affected row count.
    fn delete(&self, db: &Database) -> Result<usize>;

    /// Updates matching rows with the given field/value pairs; returns
    /// the affected row count.
    fn update(&self, db: &Database, pairs: &[(&str, Value)]) -> Result<usize>;
}

impl Execute for Query {
    fn all(&self, db: &Database) -> Result<Vec<Row>> {
        let schema = row_schema(self, db)?;
        let (sql, params) = self.render();
        let rows = db.query_rows(&sql, &params)?;
        Ok(rows
            .into_iter()
            .map(|values| Row::from_values(schema.clone(), values))
            .collect())
    }

    fn first(&self, db: &Database) -> Result<Row> {
        self.limit(1)
            .all(db)?
            .into_iter()
            .next()
            .ok_or(OrmError::DoesNotExist)
    }

    fn get(&self, db: &Database) -> Result<Row> {
        let mut rows = self.limit(2).all(db)?;
        match rows.len() {
            0 => Err(OrmError::DoesNotExist),
            1 => Ok(rows.remove(0)),
            _ => Err(OrmError::TooManyExist),
        }
    }

    fn nth(&self, db: &Database, index: u64) -> Result<Row> {
        self.slice(index..index + 1).first(db)
    }

    fn values(&self, db: &Database) -> Result<Vec<Vec<Value>>> {
        let (sql, params) = self.render();
        db.query_rows(&sql, &params)
    }

    fn scalar(&self, db: &Database) -> Result<Value> {
        let rows = self.values(db)?;
        rows.into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .ok_or(OrmError::DoesNotExist)
    }

    fn count(&self, db: &Database) -> Result<u64> {
        let value = self.count_query().scalar(db)?;
        Ok(value.as_int().unwrap_or(0).unsigned_abs())
    }

    fn exists(&self, db: &Database) -> Result<bool> {
        Ok(self.count(db)? > 0)
    }

    fn delete(&self, db: &Database) -> Result<usize> {
        let (sql, params) = self.render_delete();
        db.execute(&sql, &params)
    }

    fn update(&self, db: &Database, pairs: &[(&str, Value)]) -> Result<usize> {
        let assignments: Vec<String> =
            pairs.iter().map(|(name, _)| format!("{name} = ?")).collect();
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.table(),
            assignments.join(", ")
        );
        let mut params: Vec<Value> = pairs.iter().map(|(_, v)| v.clone()).collect();
        if let Some((where_sql, where_params)) = self.render_where() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
            params.extend(where_params);
        }
        db.execute(&sql, &params)
    }
}

/// Resolves the schema for whole-row fetches.
///
/// # Panics
///
/// Panics if the query's select list was narrowed: a projected query no
/// longer yields whole rows, read it with `values` or `scalar`.
fn row_schema<'a>(query: &Query, db: &'a Database) -> Result<&'a crate::schema::Schema> {
    assert!(
        !query.is_projected(),
        "whole-row fetch on a projected query over `{}`; use values() or scalar()",
        query.table()
    );
    db.schema(query.table())
        .ok_or_else(|| OrmError::UnknownTable(String::from(query.table())))
}
