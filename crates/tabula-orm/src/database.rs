//! The live database handle.
//!
//! [`Database`] wraps one rusqlite connection plus the schemas attached
//! at initialization. Every statement the engine runs funnels through
//! it, so failures are logged with the offending SQL and parameters
//! (nothing redacted) before the original error propagates unchanged.

use std::collections::BTreeMap;

use rusqlite::Connection;
use tracing::{debug, error};

use tabula_core::Value;

use crate::error::Result;
use crate::schema::Schema;

/// A live database handle with its attached schemas.
pub struct Database {
    conn: Connection,
    schemas: BTreeMap<String, Schema>,
    debug: bool,
}

impl Database {
    /// Wraps a connection with no schemas attached.
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            schemas: BTreeMap::new(),
            debug: false,
        }
    }

    /// Enables statement logging at debug level.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Attaches schemas, keyed by table name.
    #[must_use]
    pub fn with_schemas<I: IntoIterator<Item = Schema>>(mut self, schemas: I) -> Self {
        for schema in schemas {
            self.schemas.insert(String::from(schema.table()), schema);
        }
        self
    }

    /// Looks up an attached schema by table name.
    #[must_use]
    pub fn schema(&self, table: &str) -> Option<&Schema> {
        self.schemas.get(table)
    }

    /// Returns the underlying connection.
    #[must_use]
    pub fn handle(&self) -> &Connection {
        &self.conn
    }

    /// Executes one statement and returns the affected row count.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        self.trace(sql);
        let result = self
            .conn
            .execute(sql, rusqlite::params_from_iter(bind(params)));
        self.report(sql, params, result)
    }

    /// Executes a multi-statement script, e.g. a migration rebuild.
    pub fn execute_script(&self, sql: &str) -> Result<()> {
        self.trace(sql);
        let result = self.conn.execute_batch(sql);
        self.report(sql, &[], result)
    }

    /// Runs a query and materializes every row as a value vector.
    pub fn query_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>> {
        self.trace(sql);
        let mut stmt = self.report(sql, params, self.conn.prepare(sql))?;
        let columns = stmt.column_count();
        let mut rows = {
            let result = stmt.query(rusqlite::params_from_iter(bind(params)));
            self.report(sql, params, result)?
        };

        let mut out = vec![];
        loop {
            let row = match self.report(sql, params, rows.next())? {
                Some(row) => row,
                None => break,
            };
            let mut values = Vec::with_capacity(columns);
            for i in 0..columns {
                let value = self.report(sql, params, row.get::<_, rusqlite::types::Value>(i))?;
                values.push(from_sql(value));
            }
            out.push(values);
        }
        Ok(out)
    }

    /// Returns the live (column name, declared type) pairs of a table.
    pub fn introspect(&self, table: &str) -> Result<Vec<(String, String)>> {
        let rows = self.query_rows(
            "SELECT name, type FROM pragma_table_info(?)",
            &[Value::Text(String::from(table))],
        )?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match (row.first(), row.get(1)) {
                (Some(Value::Text(name)), Some(Value::Text(ty))) => {
                    Some((name.clone(), ty.clone()))
                }
                _ => None,
            })
            .collect())
    }

    /// Returns the rowid generated by the most recent insert.
    #[must_use]
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    fn trace(&self, sql: &str) {
        if self.debug {
            debug!(sql = %sql, "execute");
        }
    }

    fn report<T>(
        &self,
        sql: &str,
        params: &[Value],
        result: rusqlite::Result<T>,
    ) -> Result<T> {
        result.map_err(|e| {
            error!(sql = %sql, params = ?params, error = %e, "statement failed");
            e.into()
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("schemas", &self.schemas.keys())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

fn bind(params: &[Value]) -> Vec<rusqlite::types::Value> {
    params
        .iter()
        .map(|v| match v {
            Value::Null => rusqlite::types::Value::Null,
            Value::Int(n) => rusqlite::types::Value::Integer(*n),
            Value::Float(f) => rusqlite::types::Value::Real(*f),
            Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
            Value::Blob(b) => rusqlite::types::Value::Blob(b.clone()),
        })
        .collect()
}

fn from_sql(value: rusqlite::types::Value) -> Value {
    match value {
        rusqlite::types::Value::Null => Value::Null,
        rusqlite::types::Value::Integer(n) => Value::Int(n),
        rusqlite::types::Value::Real(f) => Value::Float(f),
        rusqlite::types::Value::Text(s) => Value::Text(s),
        rusqlite::types::Value::Blob(b) => Value::Blob(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Database {
        Database::new(Connection::open_in_memory().unwrap())
    }

    #[test]
    fn execute_and_query_round_trip() {
        let db = memory_db();
        db.execute("CREATE TABLE t (a TEXT, b INTEGER)", &[]).unwrap();
        db.execute(
            "INSERT INTO t VALUES (?, ?)",
            &[Value::Text(String::from("x")), Value::Int(3)],
        )
        .unwrap();

        let rows = db.query_rows("SELECT a, b FROM t", &[]).unwrap();
        assert_eq!(
            rows,
            vec![vec![Value::Text(String::from("x")), Value::Int(3)]]
        );
    }

    #[test]
    fn introspect_lists_columns_with_declared_types() {
        let db = memory_db();
        db.execute("CREATE TABLE t (a TEXT, b DATE)", &[]).unwrap();
        assert_eq!(
            db.introspect("t").unwrap(),
            vec![
                (String::from("a"), String::from("TEXT")),
                (String::from("b"), String::from("DATE")),
            ]
        );
    }

    #[test]
    fn failed_statement_reports_the_original_error() {
        let db = memory_db();
        let err = db.execute("INSERT INTO missing VALUES (1)", &[]).unwrap_err();
        assert!(matches!(err, crate::OrmError::Database(_)));
    }
}
