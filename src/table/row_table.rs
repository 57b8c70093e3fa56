//! Ordered collection of rows with a first-seen column order

use crate::errors::{FeatureError, FeatureResult};

use super::record::Record;
use super::value::Value;

/// A table of rows sharing (mostly) the same columns
///
/// The column list records the order in which column names were first
/// seen. Rows may lack a column; such cells read as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowTable {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl RowTable {
    /// Create an empty table
    pub fn new() -> Self {
        RowTable::default()
    }

    /// Create an empty table with a fixed header
    pub fn from_columns(columns: &[&str]) -> Self {
        RowTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from rows, collecting columns in first-seen order
    pub fn from_rows(rows: Vec<Record>) -> Self {
        let mut table = RowTable::new();
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Append a row, registering any columns not yet known
    pub fn push_row(&mut self, row: Record) {
        for key in row.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.to_string());
            }
        }
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Record] {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cells of one column, row-aligned
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Option<&'a Value>> + 'a {
        self.rows.iter().map(move |row| row.get(name))
    }

    /// Whether every row holds a numeric value for `name`
    pub fn is_numeric_column(&self, name: &str) -> bool {
        !self.rows.is_empty() && self.column(name).all(|v| v.map_or(false, Value::is_numeric))
    }

    /// Set (or replace) a whole column; one value per row is required
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> FeatureResult<()> {
        if values.len() != self.rows.len() {
            return Err(FeatureError::InvalidColumnValue {
                column: name.to_string(),
                row: values.len().min(self.rows.len()),
                expected: format!("{} values, got {}", self.rows.len(), values.len()),
            });
        }
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(name, value);
        }
        Ok(())
    }

    /// Remove a column from every row
    pub fn drop_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
        for row in &mut self.rows {
            row.remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_in_first_seen_order() {
        let table = RowTable::from_rows(vec![
            Record::new().with("b", 1).with("a", 2),
            Record::new().with("a", 3).with("c", 4),
        ]);
        assert_eq!(table.columns(), &["b", "a", "c"]);
        assert_eq!(table.column("c").collect::<Vec<_>>(), vec![None, Some(&Value::Integer(4))]);
    }

    #[test]
    fn test_numeric_column_detection() {
        let table = RowTable::from_rows(vec![
            Record::new().with("n", 1).with("t", "x").with("m", 1.5),
            Record::new().with("n", 2.5).with("t", 3).with("m", "oops"),
        ]);
        assert!(table.is_numeric_column("n"));
        assert!(!table.is_numeric_column("t"));
        assert!(!table.is_numeric_column("m"));
        assert!(!table.is_numeric_column("missing"));
    }

    #[test]
    fn test_set_column_requires_one_value_per_row() {
        let mut table = RowTable::from_rows(vec![Record::new().with("a", 1), Record::new().with("a", 2)]);
        assert!(table.set_column("b", vec![Value::Integer(1)]).is_err());
        table.set_column("b", vec![Value::from("x"), Value::from("y")]).unwrap();
        assert_eq!(table.columns(), &["a", "b"]);

        table.drop_column("a");
        assert_eq!(table.columns(), &["b"]);
        assert!(table.rows().iter().all(|r| !r.contains_key("a")));
    }
}
