//! Initialization configuration.

/// Options recognized by [`initialize`](crate::initialize).
///
/// Anything beyond the recognized options travels as opaque
/// `PRAGMA key = value` pairs applied to the fresh connection.
#[derive(Debug, Clone)]
pub struct Config {
    database: String,
    debug: bool,
    allow_migrations: bool,
    pragmas: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Config {
    /// Configuration for a database file at the given path.
    #[must_use]
    pub fn new(database: &str) -> Self {
        Self {
            database: String::from(database),
            debug: false,
            allow_migrations: false,
            pragmas: vec![],
        }
    }

    /// Configuration for an in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    /// Enables statement logging at debug level.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Permits divergent tables to be rebuilt at initialization.
    #[must_use]
    pub fn allow_migrations(mut self, allow: bool) -> Self {
        self.allow_migrations = allow;
        self
    }

    /// Adds an opaque pragma applied to the fresh connection.
    #[must_use]
    pub fn pragma(mut self, key: &str, value: &str) -> Self {
        self.pragmas.push((String::from(key), String::from(value)));
        self
    }

    /// Returns the database location.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns whether statement logging is enabled.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Returns whether divergent tables may be rebuilt.
    #[must_use]
    pub fn migrations_allowed(&self) -> bool {
        self.allow_migrations
    }

    /// Returns the opaque pragma pairs.
    #[must_use]
    pub fn pragmas(&self) -> &[(String, String)] {
        &self.pragmas
    }
}
