//! Schemas and the schema registry.
//!
//! A [`Schema`] is the declared structure of one table: an ordered
//! sequence of named fields plus the canonical CREATE TABLE text.
//! Field order is significant — it fixes column order in DDL and in
//! positional row construction. Schemas are immutable once built and
//! cheap to clone (shared inner).

use std::sync::Arc;

use tabula_core::{col, ColumnRef, Query, Value};

use crate::database::Database;
use crate::error::{OrmError, Result};
use crate::exec::Execute;
use crate::field::Field;
use crate::row::Row;

#[derive(Debug)]
struct SchemaInner {
    table: String,
    fields: Vec<Field>,
    has_id: bool,
    origin: Option<String>,
}

/// The declared structure of a table.
#[derive(Debug, Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl Schema {
    /// Starts building a schema. The table name is the lowercased form
    /// of the identifier, derived deterministically.
    #[must_use]
    pub fn builder(name: &str) -> SchemaBuilder {
        SchemaBuilder {
            table: name.to_lowercase(),
            fields: vec![],
            has_id: true,
            origin: None,
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.inner.table
    }

    /// Returns where the schema was declared, for duplicate reporting.
    #[must_use]
    pub fn origin(&self) -> &str {
        self.inner.origin.as_deref().unwrap_or("unknown")
    }

    /// Returns whether the schema owns an implicit `id` field.
    ///
    /// Pseudo-schemas used only for introspection views suppress it and
    /// are skipped by the migration engine.
    #[must_use]
    pub fn has_id(&self) -> bool {
        self.inner.has_id
    }

    /// Returns the fields in declaration order (implicit `id` last).
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.inner.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.inner.fields.iter().find(|f| f.name() == name)
    }

    /// Returns the position of a field by name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.inner.fields.iter().position(|f| f.name() == name)
    }

    /// Returns the column names in declaration order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.inner.fields.iter().map(Field::name).collect()
    }

    /// Returns a column reference for building expressions.
    ///
    /// # Panics
    ///
    /// Panics if the schema has no field with this name.
    #[must_use]
    pub fn col(&self, name: &str) -> ColumnRef {
        assert!(
            self.field(name).is_some(),
            "schema `{}` has no field `{name}`",
            self.table()
        );
        col(name)
    }

    /// Renders the canonical CREATE TABLE statement.
    ///
    /// This exact text is executed to create the table and later diffed
    /// byte-for-byte against the live catalog.
    #[must_use]
    pub fn create_ddl(&self) -> String {
        let clauses: Vec<String> = self.inner.fields.iter().map(Field::ddl).collect();
        format!("CREATE TABLE {} ({})", self.table(), clauses.join(", "))
    }

    /// Starts a query over this schema's table.
    #[must_use]
    pub fn query(&self) -> Query {
        Query::new(self.table())
    }

    /// Creates a detached row with every field at its default.
    #[must_use]
    pub fn row(&self) -> Row {
        Row::with_defaults(self.clone())
    }

    /// Creates a detached row from positional values.
    ///
    /// Values fill fields in declaration order; remaining fields take
    /// their defaults.
    ///
    /// # Panics
    ///
    /// Panics if more values are given than the schema has fields.
    #[must_use]
    pub fn row_from<I, V>(&self, values: I) -> Row
    where
        I: IntoIterator<Item = V>,
        V: tabula_core::ToValue,
    {
        let mut row = self.row();
        for (i, value) in values.into_iter().enumerate() {
            assert!(
                i < self.fields().len(),
                "schema `{}` takes at most {} positional values",
                self.table(),
                self.fields().len()
            );
            row.set(self.fields()[i].name(), value);
        }
        row
    }

    /// Fetches the row matching the given field/value pairs, creating
    /// and saving it if absent. Fails with [`OrmError::TooManyExist`]
    /// when the pairs match more than one row.
    pub fn get_or_create(&self, db: &Database, pairs: &[(&str, Value)]) -> Result<Row> {
        let mut q = self.query();
        for (name, value) in pairs {
            q = q.filter(self.col(name).eq(value.clone()));
        }
        match q.get(db) {
            Ok(row) => Ok(row),
            Err(OrmError::DoesNotExist) => {
                let mut row = self.row();
                for (name, value) in pairs {
                    row.set(name, value.clone());
                }
                row.save(db)?;
                Ok(row)
            }
            Err(e) => Err(e),
        }
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    table: String,
    fields: Vec<Field>,
    has_id: bool,
    origin: Option<String>,
}

impl SchemaBuilder {
    /// Registers a field under the given name.
    ///
    /// # Panics
    ///
    /// Panics if the schema already has a field with this name.
    #[must_use]
    pub fn field(mut self, name: &str, mut field: Field) -> Self {
        assert!(
            !self.fields.iter().any(|f| f.name() == name),
            "schema `{}` already has a field `{name}`",
            self.table
        );
        field.assign_name(name);
        self.fields.push(field);
        self
    }

    /// Suppresses the implicit `id` field, making this a pseudo-schema
    /// usable only for introspection views.
    #[must_use]
    pub fn without_id(mut self) -> Self {
        self.has_id = false;
        self
    }

    /// Records where the schema is declared, e.g. `module_path!()`.
    #[must_use]
    pub fn origin(mut self, origin: &str) -> Self {
        self.origin = Some(String::from(origin));
        self
    }

    /// Finalizes the schema, appending the implicit
    /// `id INTEGER PRIMARY KEY NOT NULL` field unless suppressed.
    #[must_use]
    pub fn build(self) -> Schema {
        let mut fields = self.fields;
        if self.has_id {
            assert!(
                !fields.iter().any(|f| f.name() == "id"),
                "schema `{}` declares `id` explicitly; it is implicit",
                self.table
            );
            let mut id = Field::integer().primary_key().not_null();
            id.assign_name("id");
            fields.push(id);
        }
        Schema {
            inner: Arc::new(SchemaInner {
                table: self.table,
                fields,
                has_id: self.has_id,
                origin: self.origin,
            }),
        }
    }
}

/// An explicit, caller-owned collection of schemas.
///
/// Registration order is preserved: it fixes the order migrations are
/// applied in. Duplicate table names are tolerated here and rejected at
/// initialization, so every duplicate can be reported at once.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: Vec<Schema>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema.
    pub fn register(&mut self, schema: Schema) {
        self.schemas.push(schema);
    }

    /// Returns the registered schemas in registration order.
    #[must_use]
    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }
}
