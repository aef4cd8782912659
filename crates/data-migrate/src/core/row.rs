//! Row representation handed to row processors.

use std::sync::Arc;

use super::value::SqlValue;

/// Type descriptor of the source column a value was scanned from.
///
/// The engine treats this as opaque metadata. Drivers fill in whatever they
/// know; processors may use it to make decisions about a column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnType {
    /// Database type name as reported by the driver (e.g. `MYSQL_TYPE_LONG`).
    pub name: String,
    /// Whether the column accepts NULL, when the driver reports it.
    pub nullable: Option<bool>,
    /// Declared column length, when known.
    pub length: Option<u64>,
    /// Number of decimals for numeric columns, when known.
    pub decimals: Option<u8>,
}

impl ColumnType {
    /// Create a descriptor that only carries a type name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Name and type of one column in a source row set.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: Arc<ColumnType>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type: Arc::new(column_type),
        }
    }
}

/// One column of a scanned row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub value: SqlValue,
    /// Shared with every other row of the same row set.
    pub column_type: Arc<ColumnType>,
}

/// A single record extracted from the source table.
///
/// Columns keep the order the source query returned them in, and column names
/// are unique within a row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<Column>,
}

impl Row {
    /// Build a row from scanned values, pairing each value with its column.
    ///
    /// Values beyond the number of columns are ignored; missing values are
    /// filled with NULL.
    pub fn from_values(columns: &[ColumnInfo], values: Vec<SqlValue>) -> Self {
        let mut values = values.into_iter();
        let columns = columns
            .iter()
            .map(|info| Column {
                name: info.name.clone(),
                value: values.next().unwrap_or(SqlValue::Null),
                column_type: Arc::clone(&info.column_type),
            })
            .collect();
        Self { columns }
    }

    /// Columns in source order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Column values in order.
    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.columns.iter().map(|c| &c.value)
    }

    /// Look up a column by name.
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column value by name.
    pub fn value(&self, name: &str) -> Option<&SqlValue> {
        self.get(name).map(|c| &c.value)
    }

    /// Replace the value of an existing column, returning the old value.
    pub fn set_value(&mut self, name: &str, value: SqlValue) -> Option<SqlValue> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| std::mem::replace(&mut c.value, value))
    }

    /// Rename a column in place. Returns false if `from` does not exist.
    ///
    /// Renaming onto a name already used by another column is refused so the
    /// row keeps unique column names.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if from != to && self.get(to).is_some() {
            return false;
        }
        match self.columns.iter_mut().find(|c| c.name == from) {
            Some(col) => {
                col.name = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a column, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        let cols = vec![
            ColumnInfo::new("id", ColumnType::named("LONG")),
            ColumnInfo::new("name", ColumnType::named("VARCHAR")),
            ColumnInfo::new("value", ColumnType::named("DOUBLE")),
        ];
        Row::from_values(
            &cols,
            vec![SqlValue::I64(1), "alice".into(), SqlValue::F64(2.5)],
        )
    }

    #[test]
    fn test_from_values_keeps_order() {
        let row = sample_row();
        let names: Vec<_> = row.column_names().collect();
        assert_eq!(names, vec!["id", "name", "value"]);
        assert_eq!(row.value("name"), Some(&SqlValue::Text("alice".into())));
        assert_eq!(row.get("id").unwrap().column_type.name, "LONG");
    }

    #[test]
    fn test_from_values_pads_missing_with_null() {
        let cols = vec![
            ColumnInfo::new("a", ColumnType::default()),
            ColumnInfo::new("b", ColumnType::default()),
        ];
        let row = Row::from_values(&cols, vec![SqlValue::I64(1)]);
        assert_eq!(row.len(), 2);
        assert!(row.value("b").unwrap().is_null());
    }

    #[test]
    fn test_rename_refuses_duplicate_names() {
        let mut row = sample_row();
        assert!(!row.rename("id", "name"));
        assert!(row.rename("id", "user_id"));
        assert!(row.get("id").is_none());
        assert!(row.get("user_id").is_some());
        assert!(!row.rename("missing", "other"));
    }

    #[test]
    fn test_set_value_and_remove() {
        let mut row = sample_row();
        let old = row.set_value("value", SqlValue::Null);
        assert_eq!(old, Some(SqlValue::F64(2.5)));
        assert!(row.set_value("missing", SqlValue::Null).is_none());

        let removed = row.remove("name").unwrap();
        assert_eq!(removed.name, "name");
        assert_eq!(row.len(), 2);
        assert!(row.remove("name").is_none());
    }
}
