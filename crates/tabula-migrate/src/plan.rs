//! Schema diffing against the live catalog.
//!
//! Each declared schema is classified against the catalog by comparing
//! its canonical CREATE TABLE text byte-for-byte with the stored DDL.
//! Plans are computed fresh on every initialization and never
//! persisted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tabula_orm::{Database, Execute, Field, Result, Schema, Value};

/// Classification of one declared table against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    /// Absent from the catalog; created outright, not a migration.
    New,
    /// Stored DDL matches the declared DDL exactly.
    UpToDate,
    /// Stored DDL differs; a rebuild is required.
    Divergent,
}

/// The per-table migration record.
#[derive(Debug, Clone)]
pub struct TablePlan {
    /// The table name.
    pub table: String,
    /// Classification outcome.
    pub status: TableStatus,
    /// Columns the declaration adds over the live table.
    pub added: BTreeSet<String>,
    /// Live columns the declaration no longer carries.
    pub removed: BTreeSet<String>,
}

impl TablePlan {
    fn with_status(table: &str, status: TableStatus) -> Self {
        Self {
            table: String::from(table),
            status,
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }
}

/// Renders the column delta, e.g. `+(d) -(a)`.
impl fmt::Display for TablePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let added: Vec<&str> = self.added.iter().map(String::as_str).collect();
        let removed: Vec<&str> = self.removed.iter().map(String::as_str).collect();
        write!(f, "+({}) -({})", added.join(", "), removed.join(", "))
    }
}

/// The `sqlite_master` introspection view as a pseudo-schema.
fn master_schema() -> Schema {
    Schema::builder("sqlite_master")
        .without_id()
        .field("type", Field::text())
        .field("name", Field::text())
        .field("tbl_name", Field::text())
        .field("rootpage", Field::integer())
        .field("sql", Field::text())
        .build()
}

/// Reads the live catalog: table name to stored CREATE TABLE text.
pub fn live_catalog(db: &Database) -> Result<BTreeMap<String, String>> {
    let master = master_schema();
    let rows = master
        .query()
        .project(["name", "sql"])
        .filter(master.col("type").eq("table"))
        .values(db)?;

    Ok(rows
        .into_iter()
        .filter_map(|row| match (row.first(), row.get(1)) {
            (Some(Value::Text(name)), Some(Value::Text(sql))) => {
                Some((name.clone(), sql.clone()))
            }
            _ => None,
        })
        .collect())
}

/// Classifies one declared schema against the catalog.
pub fn classify(
    db: &Database,
    catalog: &BTreeMap<String, String>,
    schema: &Schema,
) -> Result<TablePlan> {
    let table = schema.table();
    match catalog.get(table) {
        None => Ok(TablePlan::with_status(table, TableStatus::New)),
        Some(stored) if stored == &schema.create_ddl() => {
            Ok(TablePlan::with_status(table, TableStatus::UpToDate))
        }
        Some(_) => {
            let old: BTreeSet<String> = db
                .introspect(table)?
                .into_iter()
                .map(|(name, _)| name)
                .collect();
            let new: BTreeSet<String> = schema
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();
            let mut plan = TablePlan::with_status(table, TableStatus::Divergent);
            plan.added = new.difference(&old).cloned().collect();
            plan.removed = old.difference(&new).cloned().collect();
            Ok(plan)
        }
    }
}

/// Classifies every real (non-pseudo) schema, in registration order.
pub fn plan_all(db: &Database, schemas: &[Schema]) -> Result<Vec<TablePlan>> {
    let catalog = live_catalog(db)?;
    schemas
        .iter()
        .filter(|s| s.has_id())
        .map(|s| classify(db, &catalog, s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn db() -> Database {
        Database::new(Connection::open_in_memory().unwrap())
    }

    fn artist() -> Schema {
        Schema::builder("artist")
            .field("first_name", Field::text())
            .field("last_name", Field::text())
            .build()
    }

    #[test]
    fn absent_table_is_new() {
        let plan = classify(&db(), &live_catalog(&db()).unwrap(), &artist()).unwrap();
        assert_eq!(plan.status, TableStatus::New);
    }

    #[test]
    fn matching_ddl_is_up_to_date() {
        let db = db();
        let schema = artist();
        db.execute(&schema.create_ddl(), &[]).unwrap();
        let plan = classify(&db, &live_catalog(&db).unwrap(), &schema).unwrap();
        assert_eq!(plan.status, TableStatus::UpToDate);
    }

    #[test]
    fn diverging_ddl_reports_column_deltas() {
        let db = db();
        db.execute(
            "CREATE TABLE artist (first_name TEXT, stage_name TEXT, id INTEGER PRIMARY KEY NOT NULL)",
            &[],
        )
        .unwrap();
        let plan = classify(&db, &live_catalog(&db).unwrap(), &artist()).unwrap();
        assert_eq!(plan.status, TableStatus::Divergent);
        assert_eq!(plan.added, BTreeSet::from([String::from("last_name")]));
        assert_eq!(plan.removed, BTreeSet::from([String::from("stage_name")]));
        assert_eq!(plan.to_string(), "+(last_name) -(stage_name)");
    }

    #[test]
    fn catalog_reads_through_the_builder() {
        let db = db();
        let schema = artist();
        db.execute(&schema.create_ddl(), &[]).unwrap();
        let catalog = live_catalog(&db).unwrap();
        assert_eq!(catalog.get("artist"), Some(&schema.create_ddl()));
    }
}
