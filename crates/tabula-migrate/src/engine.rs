//! Initialization: catalog diffing and safe table rebuilds.

use std::collections::BTreeMap;

use rusqlite::Connection;
use tracing::{debug, info};

use tabula_orm::{Database, Schema, SchemaRegistry};

use crate::config::Config;
use crate::error::{DuplicateSchema, MigrateError, Result};
use crate::plan::{classify, live_catalog, TablePlan, TableStatus};

/// Opens the database, synchronizes every registered schema with the
/// live catalog, and returns the ready handle.
///
/// Tables absent from the catalog are created outright. Divergent
/// tables are rebuilt when [`Config::allow_migrations`] permits it;
/// otherwise initialization fails with
/// [`MigrateError::MigrationsRequired`], enumerating every pending
/// table's column delta in one message. Pseudo-schemas are attached for
/// querying but never migrated.
pub fn initialize(config: &Config, registry: SchemaRegistry) -> Result<Database> {
    check_duplicates(registry.schemas())?;

    let conn = open(config)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    for (key, value) in config.pragmas() {
        conn.execute_batch(&format!("PRAGMA {key} = {value};"))?;
    }
    let db = Database::new(conn).with_debug(config.is_debug());

    let catalog = live_catalog(&db)?;
    let mut pending: Vec<TablePlan> = vec![];
    let mut applied: Vec<TablePlan> = vec![];

    for schema in registry.schemas() {
        if !schema.has_id() {
            continue;
        }
        let plan = classify(&db, &catalog, schema)?;
        match plan.status {
            TableStatus::New => {
                db.execute(&schema.create_ddl(), &[])?;
                debug!(table = %schema.table(), "table created");
            }
            TableStatus::UpToDate => {
                debug!(table = %schema.table(), "table up to date");
            }
            TableStatus::Divergent => {
                if config.migrations_allowed() {
                    rebuild(&db, schema, &plan)?;
                    applied.push(plan);
                } else {
                    pending.push(plan);
                }
            }
        }
    }

    if !pending.is_empty() {
        return Err(MigrateError::MigrationsRequired(pending));
    }

    if applied.is_empty() {
        debug!(database = %config.database(), "database up to date");
    } else {
        db.execute_script("VACUUM;")?;
        let summary: Vec<String> = applied
            .iter()
            .map(|p| format!("{}: {p}", p.table))
            .collect();
        info!(migrations = %summary.join("; "), "migrations performed");
    }

    Ok(db.with_schemas(registry.schemas().iter().cloned()))
}

/// Rebuilds one divergent table in a single script.
///
/// Foreign-key checks are suspended around the transaction (the pragma
/// is inert inside one, and an enforced rename would rewrite other
/// tables' REFERENCES clauses to the shadow name). Inside the
/// transaction the live table is renamed aside, the new table created
/// under the original name, the columns present in both copied forward,
/// and the shadow dropped. On failure the transaction is rolled back
/// and checks re-enabled before the error propagates, so the live table
/// is either fully rebuilt or untouched.
fn rebuild(db: &Database, schema: &Schema, plan: &TablePlan) -> Result<()> {
    let table = schema.table();
    let shared: Vec<&str> = schema
        .column_names()
        .into_iter()
        .filter(|name| !plan.added.contains(*name))
        .collect();

    let mut script = format!(
        "PRAGMA foreign_keys = OFF;\n\
         BEGIN;\n\
         DROP TABLE IF EXISTS _{table};\n\
         ALTER TABLE {table} RENAME TO _{table};\n\
         {create};\n",
        create = schema.create_ddl(),
    );
    if !shared.is_empty() {
        let columns = shared.join(", ");
        script.push_str(&format!(
            "INSERT INTO {table}({columns}) SELECT {columns} FROM _{table};\n"
        ));
    }
    script.push_str(&format!(
        "DROP TABLE _{table};\n\
         COMMIT;\n\
         PRAGMA foreign_keys = ON;\n"
    ));

    info!(table = %table, added = ?plan.added, removed = ?plan.removed, "rebuilding table");
    if let Err(e) = db.execute_script(&script) {
        let _ = db
            .handle()
            .execute_batch("ROLLBACK; PRAGMA foreign_keys = ON;");
        return Err(e.into());
    }
    Ok(())
}

/// Fails when two registrations resolve to the same table name,
/// reporting every duplicate and its origin before any DDL runs.
fn check_duplicates(schemas: &[Schema]) -> Result<()> {
    let mut by_table: BTreeMap<&str, Vec<&Schema>> = BTreeMap::new();
    for schema in schemas {
        if schema.has_id() {
            by_table.entry(schema.table()).or_default().push(schema);
        }
    }
    let duplicates: Vec<DuplicateSchema> = by_table
        .into_iter()
        .filter(|(_, claimants)| claimants.len() > 1)
        .map(|(table, claimants)| DuplicateSchema {
            table: String::from(table),
            origins: claimants.iter().map(|s| String::from(s.origin())).collect(),
        })
        .collect();
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(MigrateError::DuplicateSchema(duplicates))
    }
}

fn open(config: &Config) -> rusqlite::Result<Connection> {
    if config.database() == ":memory:" {
        Connection::open_in_memory()
    } else {
        Connection::open(config.database())
    }
}
