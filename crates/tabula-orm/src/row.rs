//! Row instances and their persistence.
//!
//! A [`Row`] maps field names to bound values, in the owning schema's
//! field order. Rows are exclusively owned by the caller; the `id`
//! field is null until the first save and nulled again on delete.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tabula_core::{ToValue, Value};

use crate::database::Database;
use crate::error::{OrmError, Result};
use crate::exec::Execute;
use crate::schema::Schema;

/// One row of a schema's table.
#[derive(Debug, Clone)]
pub struct Row {
    schema: Schema,
    values: Vec<Value>,
    /// Resolved foreign-key rows, cached on first access.
    resolved: BTreeMap<String, Row>,
}

impl Row {
    /// Creates a row with every field at its default value.
    pub(crate) fn with_defaults(schema: Schema) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|f| f.default_value().cloned().unwrap_or(Value::Null))
            .collect();
        Self {
            schema,
            values,
            resolved: BTreeMap::new(),
        }
    }

    /// Creates a row from fetched values, one per schema field.
    pub(crate) fn from_values(schema: Schema, values: Vec<Value>) -> Self {
        debug_assert_eq!(values.len(), schema.fields().len());
        Self {
            schema,
            values,
            resolved: BTreeMap::new(),
        }
    }

    /// Returns the owning schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the values in field order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns a field's value.
    ///
    /// # Panics
    ///
    /// Panics if the schema has no field with this name.
    #[must_use]
    pub fn get(&self, field: &str) -> &Value {
        &self.values[self.index_of(field)]
    }

    /// Sets a field's value. A `&Row` value serializes to its id, so a
    /// row can be assigned directly to a foreign-key field.
    ///
    /// # Panics
    ///
    /// Panics if the schema has no field with this name.
    pub fn set<V: ToValue>(&mut self, field: &str, value: V) {
        let idx = self.index_of(field);
        self.values[idx] = value.to_value();
        self.resolved.remove(field);
    }

    /// Returns the primary key, or `None` while the row is detached.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.schema
            .index_of("id")
            .and_then(|idx| self.values[idx].as_int())
    }

    /// Saves the row with a single upsert keyed on the primary key.
    ///
    /// A newly generated key populates the in-memory `id`; an existing
    /// id is retained across updates.
    ///
    /// # Panics
    ///
    /// Panics when called on a row of a pseudo-schema (no `id` field).
    pub fn save(&mut self, db: &Database) -> Result<()> {
        let id_idx = match self.schema.index_of("id") {
            Some(idx) => idx,
            None => panic!("cannot save a row of pseudo-schema `{}`", self.schema.table()),
        };

        let names = self.schema.column_names();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        let assignments: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{name}=?{}", i + 1))
            .collect();
        let sql = format!(
            "INSERT INTO {table} VALUES ({values}) \
             ON CONFLICT(id) DO UPDATE SET {assignments} WHERE id=?{id_param}",
            table = self.schema.table(),
            values = placeholders.join(", "),
            assignments = assignments.join(", "),
            id_param = id_idx + 1,
        );

        db.execute(&sql, &self.values)?;
        if self.values[id_idx].is_null() {
            self.values[id_idx] = Value::Int(db.last_insert_id());
        }
        Ok(())
    }

    /// Deletes the row by id, if it has one, and detaches it by nulling
    /// the in-memory `id`. Returns whether a delete was issued.
    pub fn delete(&mut self, db: &Database) -> Result<bool> {
        let Some(id) = self.id() else {
            return Ok(false);
        };
        let sql = format!("DELETE FROM {} WHERE id = ?", self.schema.table());
        db.execute(&sql, &[Value::Int(id)])?;
        if let Some(idx) = self.schema.index_of("id") {
            self.values[idx] = Value::Null;
        }
        Ok(true)
    }

    /// Resolves a foreign-key field to the referenced row, fetching it
    /// on first access and caching it on this row afterwards.
    ///
    /// Fails with [`OrmError::DoesNotExist`] when the stored key does
    /// not match a referenced row (including a null key).
    ///
    /// # Panics
    ///
    /// Panics if the field is not a foreign key.
    pub fn related(&mut self, field: &str, db: &Database) -> Result<&Row> {
        let idx = self.index_of(field);
        let target = match self.schema.fields()[idx].referenced_table() {
            Some(table) => String::from(table),
            None => panic!(
                "field `{field}` of schema `{}` is not a foreign key",
                self.schema.table()
            ),
        };

        if let Entry::Vacant(slot) = self.resolved.entry(String::from(field)) {
            let target_schema = db
                .schema(&target)
                .ok_or_else(|| OrmError::UnknownTable(target.clone()))?
                .clone();
            let key = self.values[idx].clone();
            let row = target_schema
                .query()
                .filter(target_schema.col("id").eq(key))
                .get(db)?;
            slot.insert(row);
        }
        Ok(&self.resolved[field])
    }

    fn index_of(&self, field: &str) -> usize {
        match self.schema.index_of(field) {
            Some(idx) => idx,
            None => panic!(
                "schema `{}` has no field `{field}`",
                self.schema.table()
            ),
        }
    }
}

/// Rows compare field-for-field; the resolution cache is ignored.
impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.schema.table() == other.schema.table() && self.values == other.values
    }
}

/// A row also compares equal to its own id.
impl PartialEq<i64> for Row {
    fn eq(&self, other: &i64) -> bool {
        self.id() == Some(*other)
    }
}

/// A row used as a value serializes to its id, so rows can be passed
/// directly as foreign-key values in filters and assignments.
impl ToValue for &Row {
    fn to_value(self) -> Value {
        match self.id() {
            Some(id) => Value::Int(id),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    fn artist() -> Schema {
        Schema::builder("artist")
            .field("first_name", Field::text().default("NA"))
            .field("last_name", Field::text().default("NA"))
            .build()
    }

    #[test]
    fn new_row_takes_defaults_and_null_id() {
        let row = artist().row();
        assert_eq!(row.get("first_name"), &Value::Text(String::from("NA")));
        assert_eq!(row.id(), None);
    }

    #[test]
    fn positional_construction_fills_in_order() {
        let row = artist().row_from(["Doja", "Cat"]);
        assert_eq!(row.get("first_name"), &Value::Text(String::from("Doja")));
        assert_eq!(row.get("last_name"), &Value::Text(String::from("Cat")));
    }

    #[test]
    fn row_compares_equal_to_its_id() {
        let schema = artist();
        let mut row = schema.row();
        row.set("id", 7);
        assert!(row == 7);
        assert!(row != 8);
    }

    #[test]
    fn row_serializes_to_its_id_as_a_value() {
        let schema = artist();
        let mut row = schema.row();
        assert_eq!((&row).to_value(), Value::Null);
        row.set("id", 3);
        assert_eq!((&row).to_value(), Value::Int(3));
    }

    #[test]
    #[should_panic(expected = "no field")]
    fn unknown_field_access_panics() {
        let _ = artist().row().get("middle_name");
    }
}
