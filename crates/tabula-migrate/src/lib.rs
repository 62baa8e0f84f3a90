//! # tabula-migrate
//!
//! Keeps a live SQLite database synchronized with declared tabula
//! schemas, without hand-written migration scripts.
//!
//! On [`initialize`], every registered schema's canonical CREATE TABLE
//! text is compared against the catalog:
//!
//! - **New** tables are created outright (not a migration).
//! - **Up-to-date** tables (byte-identical stored DDL) are left alone.
//! - **Divergent** tables are rebuilt in place — rename aside, create
//!   fresh, copy the columns present in both old and new declarations,
//!   drop the shadow — inside one transaction with foreign-key checks
//!   suspended. Retained columns keep their data; added columns take
//!   their declared default.
//!
//! Rebuilds only run when the configuration allows them; otherwise
//! initialization fails loudly, listing every divergent table and its
//! column delta, rather than run against a stale schema.
//!
//! # Example
//!
//! ```
//! use tabula_migrate::prelude::*;
//!
//! let artist = Schema::builder("Artist")
//!     .field("first_name", Field::text().default("NA"))
//!     .field("last_name", Field::text().default("NA"))
//!     .origin(module_path!())
//!     .build();
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register(artist.clone());
//!
//! let db = initialize(&Config::in_memory(), registry)?;
//! let mut row = artist.row_from(["Doja", "Cat"]);
//! row.save(&db)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod engine;
mod error;
mod plan;

pub use config::Config;
pub use engine::initialize;
pub use error::{DuplicateSchema, MigrateError, Result};
pub use plan::{classify, live_catalog, plan_all, TablePlan, TableStatus};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::engine::initialize;
    pub use crate::error::{MigrateError, Result};
    pub use crate::plan::{TablePlan, TableStatus};
    pub use tabula_orm::{
        col, Database, Execute, Field, FkAction, OrmError, Query, Row, Schema, SchemaRegistry,
        Value,
    };
}
