//! Column descriptors and their DDL rendering.
//!
//! A [`Field`] describes one column: value type, default, constraints,
//! and referential behavior. Its rendered clause is the unit of schema
//! comparison in the migration engine, so rendering must be
//! deterministic and whitespace-stable: the same configuration always
//! produces the same exact text.

use tabula_core::{ToValue, Value};

/// The value type of a column.
///
/// Primitive kinds map to SQLite affinities through a closed table;
/// [`ColumnType::Named`] carries any other declared type name verbatim
/// (DATE, DATETIME, custom codec names), and [`ColumnType::References`]
/// marks a foreign key, which always renders as an integer referencing
/// the target table's primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// No value type; NULL affinity.
    Null,
    /// Integer affinity.
    Integer,
    /// Floating-point affinity.
    Real,
    /// Text affinity.
    Text,
    /// Binary blob affinity.
    Blob,
    /// A literal type name, passed through as declared.
    Named(String),
    /// A foreign key to another schema's table.
    References(String),
}

impl ColumnType {
    fn to_sql(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Integer => String::from("INTEGER"),
            Self::Real => String::from("REAL"),
            Self::Text => String::from("TEXT"),
            Self::Blob => String::from("BLOB"),
            Self::Named(name) => name.clone(),
            Self::References(table) => format!("INTEGER REFERENCES {table}"),
        }
    }
}

/// Referential action for `ON DELETE` / `ON UPDATE` clauses.
///
/// [`FkAction::NoAction`] is the default and is never rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FkAction {
    /// No action (the engine default).
    #[default]
    NoAction,
    /// Forbid deleting/updating the referenced row.
    Restrict,
    /// Null out the referencing column.
    SetNull,
    /// Reset the referencing column to its default.
    SetDefault,
    /// Cascade the delete/update to referencing rows.
    Cascade,
}

impl FkAction {
    fn to_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Cascade => "CASCADE",
        }
    }
}

/// Conflict-resolution policy for NOT NULL constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// Roll back the current transaction.
    Rollback,
    /// Abort the current statement.
    Abort,
    /// Fail the statement, keeping prior changes.
    Fail,
    /// Skip the offending row.
    Ignore,
    /// Replace the conflicting row.
    Replace,
}

impl Conflict {
    fn to_sql(self) -> &'static str {
        match self {
            Self::Rollback => "ROLLBACK",
            Self::Abort => "ABORT",
            Self::Fail => "FAIL",
            Self::Ignore => "IGNORE",
            Self::Replace => "REPLACE",
        }
    }
}

/// One column of a schema.
///
/// Fields are built unnamed; the name is assigned exactly once when the
/// field is registered into a schema. Rendering an unnamed field is a
/// programming error and panics rather than emit malformed DDL.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: Option<String>,
    ty: ColumnType,
    default: Option<Value>,
    primary_key: bool,
    not_null: bool,
    conflict: Option<Conflict>,
    on_delete: FkAction,
    on_update: FkAction,
    generated: Option<String>,
    stored: bool,
}

impl Field {
    /// Creates a field of the given column type.
    #[must_use]
    pub fn new(ty: ColumnType) -> Self {
        Self {
            name: None,
            ty,
            default: None,
            primary_key: false,
            not_null: false,
            conflict: None,
            on_delete: FkAction::NoAction,
            on_update: FkAction::NoAction,
            generated: None,
            stored: false,
        }
    }

    /// A TEXT column.
    #[must_use]
    pub fn text() -> Self {
        Self::new(ColumnType::Text)
    }

    /// An INTEGER column.
    #[must_use]
    pub fn integer() -> Self {
        Self::new(ColumnType::Integer)
    }

    /// A REAL column.
    #[must_use]
    pub fn real() -> Self {
        Self::new(ColumnType::Real)
    }

    /// A BLOB column.
    #[must_use]
    pub fn blob() -> Self {
        Self::new(ColumnType::Blob)
    }

    /// A DATE column (literal type name, date values stored as text).
    #[must_use]
    pub fn date() -> Self {
        Self::new(ColumnType::Named(String::from("DATE")))
    }

    /// A DATETIME column.
    #[must_use]
    pub fn datetime() -> Self {
        Self::new(ColumnType::Named(String::from("DATETIME")))
    }

    /// A column with a literal type name.
    #[must_use]
    pub fn named(type_name: &str) -> Self {
        Self::new(ColumnType::Named(String::from(type_name)))
    }

    /// A foreign key referencing another schema's table.
    #[must_use]
    pub fn references(table: &str) -> Self {
        Self::new(ColumnType::References(String::from(table)))
    }

    /// Sets the default value.
    #[must_use]
    pub fn default<V: ToValue>(mut self, value: V) -> Self {
        self.default = Some(value.to_value());
        self
    }

    /// Marks the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Adds a NOT NULL constraint.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Sets the conflict policy rendered with the NOT NULL constraint.
    #[must_use]
    pub fn on_conflict(mut self, policy: Conflict) -> Self {
        self.conflict = Some(policy);
        self
    }

    /// Sets the ON DELETE referential action.
    #[must_use]
    pub fn on_delete(mut self, action: FkAction) -> Self {
        self.on_delete = action;
        self
    }

    /// Sets the ON UPDATE referential action.
    #[must_use]
    pub fn on_update(mut self, action: FkAction) -> Self {
        self.on_update = action;
        self
    }

    /// Makes this a generated column computed from the expression.
    #[must_use]
    pub fn generated(mut self, expr: &str) -> Self {
        self.generated = Some(String::from(expr));
        self
    }

    /// Stores the generated column instead of computing it on read.
    #[must_use]
    pub fn stored(mut self) -> Self {
        self.stored = true;
        self
    }

    /// Returns the field name.
    ///
    /// # Panics
    ///
    /// Panics if the field has not been registered into a schema yet.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => panic!("field used before registration into a schema"),
        }
    }

    /// Returns the column type.
    #[must_use]
    pub fn column_type(&self) -> &ColumnType {
        &self.ty
    }

    /// Returns the default value, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the referenced table name if this field is a foreign key.
    #[must_use]
    pub fn referenced_table(&self) -> Option<&str> {
        match &self.ty {
            ColumnType::References(table) => Some(table),
            _ => None,
        }
    }

    /// Assigns the name. Called once, at schema registration.
    pub(crate) fn assign_name(&mut self, name: &str) {
        assert!(
            self.name.is_none(),
            "field `{name}` was already registered under another name"
        );
        self.name = Some(String::from(name));
    }

    /// Renders the column clause.
    ///
    /// Clause order is fixed: name, type, ON DELETE, ON UPDATE,
    /// DEFAULT, PRIMARY KEY, NOT NULL (with conflict policy), AS with
    /// STORED. Only applicable clauses are emitted, joined by single
    /// spaces.
    ///
    /// # Panics
    ///
    /// Panics if the field has not been named yet.
    #[must_use]
    pub fn ddl(&self) -> String {
        let mut parts = vec![String::from(self.name()), self.ty.to_sql()];

        if self.on_delete != FkAction::NoAction {
            parts.push(format!("ON DELETE {}", self.on_delete.to_sql()));
        }
        if self.on_update != FkAction::NoAction {
            parts.push(format!("ON UPDATE {}", self.on_update.to_sql()));
        }
        if let Some(default) = &self.default {
            parts.push(format!("DEFAULT ({})", default.to_literal()));
        }
        if self.primary_key {
            parts.push(String::from("PRIMARY KEY"));
        }
        if self.not_null {
            match self.conflict {
                Some(policy) => parts.push(format!("NOT NULL ON CONFLICT {}", policy.to_sql())),
                None => parts.push(String::from("NOT NULL")),
            }
        }
        if let Some(expr) = &self.generated {
            if self.stored {
                parts.push(format!("AS ({expr}) STORED"));
            } else {
                parts.push(format!("AS ({expr})"));
            }
        }

        parts.join(" ")
    }
}
