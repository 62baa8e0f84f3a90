//! Error types for the ORM.

use thiserror::Error;

/// ORM-specific errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database error from rusqlite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No row found where one was required.
    #[error("no rows returned where one was required")]
    DoesNotExist,

    /// More than one row found where exactly one was required.
    #[error("multiple rows returned where exactly one was required")]
    TooManyExist,

    /// No schema attached to the database under this table name.
    #[error("no schema registered for table `{0}`")]
    UnknownTable(String),
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;
