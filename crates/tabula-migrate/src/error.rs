//! Error types for the migration engine.

use tabula_orm::OrmError;

use crate::plan::TablePlan;

/// A table name claimed by more than one schema registration.
#[derive(Debug, Clone)]
pub struct DuplicateSchema {
    /// The contested table name.
    pub table: String,
    /// Origin of every registration that resolved to it.
    pub origins: Vec<String>,
}

/// Errors that abort initialization.
///
/// These are fatal: the process must not run against a database whose
/// schema is inconsistent with what was declared.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Two or more registrations resolved to the same table name.
    #[error("duplicate schema registrations:\n{}", .0.iter().map(|d| format!("{:>16} in {}", d.table, d.origins.join(", "))).collect::<Vec<_>>().join("\n"))]
    DuplicateSchema(Vec<DuplicateSchema>),

    /// Divergent tables found while migrations are disallowed.
    #[error("migrations needed, but not allowed:\n{}", .0.iter().map(|p| format!("{:>16}: {p}", p.table)).collect::<Vec<_>>().join("\n"))]
    MigrationsRequired(Vec<TablePlan>),

    /// Database error from rusqlite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Error from the ORM layer.
    #[error(transparent)]
    Orm(#[from] OrmError),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
