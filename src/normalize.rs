//! Display-range normalization of numeric columns
//!
//! Numeric columns are min-max rescaled into `[margin / 2, 1 - margin / 2]`,
//! the fraction of the viewer canvas in which points are drawn. The output
//! keeps only what the viewer consumes: the rescaled columns, a fresh `id`
//! and the `thumbnail` / `image_file` columns. Text and image columns are
//! dropped.

use log::debug;

use crate::errors::{FeatureError, FeatureResult};
use crate::table::{Record, RowTable, Value, AUXILIARY_COLUMNS, ID_COLUMN, IMAGE_FILE_COLUMN, THUMBNAIL_COLUMN};

/// Rescales numeric columns into the display range
#[derive(Debug, Clone, Copy)]
pub struct ColumnNormalizer {
    margin: f64,
}

/// Observed range of one numeric column
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColumnRange {
    min: f64,
    /// `max - min`, or 1 when the column is constant
    span: f64,
}

impl ColumnNormalizer {
    /// Create a normalizer keeping `margin` of the [0, 1] range as border
    pub fn new(margin: f64) -> Self {
        ColumnNormalizer { margin }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Lower and upper bound of normalized values
    pub fn output_range(&self) -> (f64, f64) {
        (self.margin / 2.0, 1.0 - self.margin / 2.0)
    }

    /// Normalize a table for display
    ///
    /// Any existing `id` column is replaced by the row position rather than
    /// rescaled. A non-empty table must carry `thumbnail` and `image_file`.
    /// NaN and infinite values do not count towards a column's range and
    /// are left as empty cells.
    pub fn normalize(&self, table: &RowTable) -> FeatureResult<RowTable> {
        if table.is_empty() {
            return Ok(RowTable::from_columns(&[ID_COLUMN, THUMBNAIL_COLUMN, IMAGE_FILE_COLUMN]));
        }
        for required in [THUMBNAIL_COLUMN, IMAGE_FILE_COLUMN] {
            if !table.has_column(required) {
                return Err(FeatureError::missing_column(required, "every row needs a thumbnail and an image file"));
            }
        }

        let numeric: Vec<(&str, ColumnRange)> = table
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| !AUXILIARY_COLUMNS.contains(c) && table.is_numeric_column(c))
            .map(|c| (c, column_range(table, c)))
            .collect();
        debug!(
            "Normalizing {} numeric columns: {:?}",
            numeric.len(),
            numeric.iter().map(|(c, _)| *c).collect::<Vec<_>>()
        );

        let header: Vec<&str> = numeric
            .iter()
            .map(|(c, _)| *c)
            .chain([ID_COLUMN, THUMBNAIL_COLUMN, IMAGE_FILE_COLUMN])
            .collect();
        let mut normalized = RowTable::from_columns(&header);
        for (index, row) in table.rows().iter().enumerate() {
            let mut out = Record::new();
            for (column, range) in &numeric {
                match row.get(column).and_then(Value::as_f64) {
                    Some(value) if value.is_finite() => {
                        out.insert(*column, self.rescale(value, range));
                    }
                    _ => debug!("Row {} has no finite {}, leaving it empty", index, column),
                }
            }
            out.insert(ID_COLUMN, index);
            for aux in [THUMBNAIL_COLUMN, IMAGE_FILE_COLUMN] {
                let value = row.get(aux).cloned().ok_or_else(|| FeatureError::InvalidColumnValue {
                    column: aux.to_string(),
                    row: index,
                    expected: "a value, found an empty cell".to_string(),
                })?;
                out.insert(aux, value);
            }
            normalized.push_row(out);
        }

        Ok(normalized)
    }

    fn rescale(&self, value: f64, range: &ColumnRange) -> f64 {
        (value - range.min) / range.span * (1.0 - self.margin) + self.margin / 2.0
    }
}

fn column_range(table: &RowTable, column: &str) -> ColumnRange {
    let (min, max) = table
        .column(column)
        .filter_map(|v| v.and_then(Value::as_f64))
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        return ColumnRange { min: 0.0, span: 1.0 };
    }
    let span = max - min;
    ColumnRange {
        min,
        span: if span == 0.0 { 1.0 } else { span },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(x: f64, label: i64, text: &str) -> Record {
        Record::new()
            .with("x", x)
            .with("label", label)
            .with("text", text)
            .with("thumbnail", "AAAA")
            .with("image_file", format!("/tmp/{}.png", label))
    }

    fn floats(table: &RowTable, column: &str) -> Vec<f64> {
        table.column(column).map(|v| v.and_then(Value::as_f64).unwrap()).collect()
    }

    #[test]
    fn test_rescale_into_margin_range() {
        let table = RowTable::from_rows(vec![row(0.0, 1, "a"), row(5.0, 2, "b"), row(10.0, 3, "c")]);
        let out = ColumnNormalizer::new(0.2).normalize(&table).unwrap();

        let xs = floats(&out, "x");
        assert!((xs[0] - 0.1).abs() < 1e-12);
        assert!((xs[1] - 0.5).abs() < 1e-12);
        assert!((xs[2] - 0.9).abs() < 1e-12);
        assert_eq!(out.columns(), &["x", "label", "id", "thumbnail", "image_file"]);
    }

    #[test]
    fn test_constant_column_collapses_to_lower_bound() {
        let table = RowTable::from_rows(vec![row(7.0, 4, "a"), row(7.0, 4, "b")]);
        let out = ColumnNormalizer::new(0.3).normalize(&table).unwrap();
        for v in floats(&out, "x") {
            assert_eq!(v, 0.15);
        }
    }

    #[test]
    fn test_id_is_row_position_not_rescaled() {
        let table = RowTable::from_rows(vec![
            row(1.0, 1, "a").with("id", 40),
            row(2.0, 2, "b").with("id", 10),
        ]);
        let out = ColumnNormalizer::new(0.2).normalize(&table).unwrap();
        let ids: Vec<_> = out.column("id").map(|v| v.cloned()).collect();
        assert_eq!(ids, vec![Some(Value::Integer(0)), Some(Value::Integer(1))]);
    }

    #[test]
    fn test_text_columns_are_dropped() {
        let table = RowTable::from_rows(vec![row(1.0, 1, "a")]);
        let out = ColumnNormalizer::new(0.2).normalize(&table).unwrap();
        assert!(!out.has_column("text"));
        assert_eq!(out.rows()[0].get("thumbnail"), Some(&Value::Text("AAAA".to_string())));
    }

    #[test]
    fn test_non_finite_values_stay_empty() {
        let table = RowTable::from_rows(vec![
            row(f64::NAN, 1, "a"),
            row(2.0, 2, "b"),
            row(f64::INFINITY, 3, "c"),
            row(6.0, 4, "d"),
        ]);
        let out = ColumnNormalizer::new(0.2).normalize(&table).unwrap();

        assert_eq!(out.columns(), &["x", "label", "id", "thumbnail", "image_file"]);
        let xs: Vec<Option<f64>> = out.column("x").map(|v| v.and_then(Value::as_f64)).collect();
        assert_eq!(xs[0], None);
        assert_eq!(xs[2], None);
        assert!((xs[1].unwrap() - 0.1).abs() < 1e-12);
        assert!((xs[3].unwrap() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_missing_auxiliary_column() {
        let table = RowTable::from_rows(vec![Record::new().with("x", 1.0).with("thumbnail", "AAAA")]);
        let result = ColumnNormalizer::new(0.2).normalize(&table);
        assert!(matches!(result, Err(FeatureError::MissingRequiredColumn { .. })));
    }

    #[test]
    fn test_empty_table_keeps_auxiliary_header() {
        let out = ColumnNormalizer::new(0.2).normalize(&RowTable::new()).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.columns(), &["id", "thumbnail", "image_file"]);
    }
}
